//! # CLI Module
//!
//! Command-line interface for paylog.
//!
//! ## Commands
//!
//! - `serve`: Run the host service with request tracking and background rotation
//! - `rotate`: Run a single rotation sweep over a log directory
//! - `validate-env`: Validate environment configuration and print the result
//! - `env-example`: Print an example `.env` file
//!
//! ## Usage Example
//!
//! ```bash
//! # Forward to the payment API on port 5000 and log under ./logs
//! PAYLOG_UPSTREAM_URL=http://localhost:5000 paylog serve
//!
//! # Rotate anything over 1 MiB right now
//! paylog rotate --log-dir ./logs --max-bytes 1048576
//! ```

use crate::env::{
    DEFAULT_LOG_FILTER, generate_env_example, get_config, log_filter_directives,
    print_validation_results, validate_environment,
};
use crate::logging::rotation::DEFAULT_MAX_LOG_BYTES;
use crate::logging::{ConsoleSink, FileSink, Logger};
use crate::server::start_server;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

///////////////////////////////////////////////////////////////////////////////
//****                        Private Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Parser)]
#[command(name = "paylog")]
#[command(about = "Categorized logging and request tracking for the payment backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

///////////////////////////////////////////////////////////////////////////////
//****                         Private Types                             ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Subcommand)]
enum Commands {
    /// Start the host service in front of the payment API
    #[command(name = "serve", alias = "start")]
    Serve,
    /// Rotate every category log above the size threshold
    #[command(name = "rotate")]
    Rotate {
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MAX_LOG_BYTES)]
        max_bytes: u64,
    },
    /// Validate environment configuration
    #[command(name = "validate-env")]
    ValidateEnv,
    /// Print an example environment file
    #[command(name = "env-example")]
    EnvExample,
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Parse the command line and run the selected command
pub async fn parse_cli_commands() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            // Subscriber first, so configuration warnings are visible
            init_tracing(&log_filter_directives());
            let config = get_config();
            start_server(config).await?;
        }
        Commands::Rotate { log_dir, max_bytes } => {
            init_tracing(&log_filter_directives());
            let files = Arc::new(FileSink::new(&log_dir)?);
            let logger = Logger::new(files.clone(), Arc::new(ConsoleSink::default()))
                .with_max_log_bytes(max_bytes);

            let rotated = logger.rotate_logs();
            if rotated.is_empty() {
                println!(
                    "No log files above {} bytes in {}",
                    logger.max_log_bytes(),
                    files.dir().display()
                );
            }
            for backup in rotated {
                println!("Rotated: {}", backup.display());
            }
        }
        Commands::ValidateEnv => {
            let result = validate_environment();
            print_validation_results(&result);
            if result.is_err() {
                return Err("environment validation failed".into());
            }
        }
        Commands::EnvExample => {
            print!("{}", generate_env_example());
        }
    }

    Ok(())
}

/// Install the `tracing` subscriber, falling back to the default filter when
/// `directives` does not parse
pub fn init_tracing(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}': {}", directives, e);
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
