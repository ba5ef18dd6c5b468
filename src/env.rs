//! Environment variable validation and configuration module for paylog
//!
//! This module provides centralized validation and configuration management
//! for all environment variables used by the logging service and its host server.
//!
//! # Supported Environment Variables
//!
//! ## Server Configuration
//! - `PAYLOG_HOST`: Server bind address (default: "0.0.0.0")
//! - `PAYLOG_PORT`: Server port (default: "3000")
//! - `PAYLOG_UPSTREAM_URL`: Base URL of the payment API requests are forwarded to
//!   (default: "http://localhost:5000")
//! - `PAYLOG_TRUST_PROXY`: Take the client address from `X-Forwarded-For`
//!   (default: "false")
//!
//! ## Logging Configuration
//! - `RUST_LOG`: Standard Rust logging configuration
//! - `PAYLOG_LOG_LEVEL`: Application-specific log level override
//! - `PAYLOG_LOG_DIR`: Directory holding the category log files (default: "logs")
//! - `PAYLOG_CONSOLE_COLOR`: Color console entries by level (default: "true")
//!
//! ## Rotation and Thresholds
//! - `PAYLOG_ROTATION_MAX_BYTES`: Rotate files larger than this (default: "10485760")
//! - `PAYLOG_ROTATION_INTERVAL_SECS`: Seconds between rotation sweeps (default: "3600")
//! - `PAYLOG_SLOW_REQUEST_MS`: Requests slower than this get a performance entry (default: "1000")
//! - `PAYLOG_SLOW_OPERATION_MS`: Timings slower than this warn on the console (default: "1000")
//!
//! # Usage
//!
//! ```rust,ignore
//! use paylog::env::{validate_environment, get_config};
//!
//! // Validate all environment variables at startup
//! let validation_result = validate_environment();
//! if let Err(errors) = validation_result {
//!     for error in errors {
//!         eprintln!("Environment validation error: {}", error.message);
//!     }
//!     std::process::exit(1);
//! }
//!
//! // Get validated configuration
//! let config = get_config();
//! println!("Server will bind to {}:{}", config.host, config.port);
//! ```

use crate::logging::LoggerConfig;
use crate::logging::logger::DEFAULT_SLOW_OPERATION_MS;
use crate::logging::rotation::{DEFAULT_MAX_LOG_BYTES, DEFAULT_ROTATION_INTERVAL_SECONDS};
use crate::middleware::DEFAULT_SLOW_REQUEST_MS;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Default `tracing` filter when neither `PAYLOG_LOG_LEVEL` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "paylog=info,tower_http=debug";

/// Environment validation errors
#[derive(Debug, Clone)]
pub struct EnvValidationError {
    pub variable: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Severity level for environment validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    /// Critical errors that prevent application startup
    Critical,
    /// Warnings about invalid optional values that fell back to defaults
    Warning,
    /// Informational messages about default values being used
    Info,
}

/// Validated application configuration derived from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub host: String,
    pub port: u16,
    pub bind_address: SocketAddr,
    pub upstream_url: String,
    pub trust_proxy: bool,

    // Logging
    pub log_level: String,
    pub log_dir: PathBuf,
    pub console_color: bool,

    // Rotation and thresholds
    pub rotation_max_bytes: u64,
    pub rotation_interval_secs: u64,
    pub slow_request_ms: u64,
    pub slow_operation_ms: u64,
}

impl AppConfig {
    /// Logger settings derived from this configuration
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            log_dir: self.log_dir.clone(),
            console_color: self.console_color,
            max_log_bytes: self.rotation_max_bytes,
            slow_operation_threshold: Duration::from_millis(self.slow_operation_ms),
        }
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs)
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_ms)
    }
}

/// Validate all environment variables and return configuration or errors
pub fn validate_environment() -> Result<AppConfig, Vec<EnvValidationError>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Server configuration
    let host = env::var("PAYLOG_HOST").unwrap_or_else(|_| {
        warnings.push(EnvValidationError {
            variable: "PAYLOG_HOST".to_string(),
            message: "Using default host '0.0.0.0'".to_string(),
            severity: ErrorSeverity::Info,
        });
        "0.0.0.0".to_string()
    });

    // Validate host is a valid IP address
    let host_ip = match IpAddr::from_str(&host) {
        Ok(ip) => Some(ip),
        Err(_) => {
            errors.push(EnvValidationError {
                variable: "PAYLOG_HOST".to_string(),
                message: format!("Invalid IP address: {}", host),
                severity: ErrorSeverity::Critical,
            });
            None
        }
    };

    let port = match env::var("PAYLOG_PORT") {
        Ok(port_str) => match port_str.parse::<u16>() {
            Ok(port) => {
                if port < 1024 && port != 0 {
                    warnings.push(EnvValidationError {
                        variable: "PAYLOG_PORT".to_string(),
                        message: format!(
                            "Using privileged port {}, may require root privileges",
                            port
                        ),
                        severity: ErrorSeverity::Warning,
                    });
                }
                port
            }
            Err(_) => {
                errors.push(EnvValidationError {
                    variable: "PAYLOG_PORT".to_string(),
                    message: format!("Invalid port number: {}", port_str),
                    severity: ErrorSeverity::Critical,
                });
                3000 // fallback
            }
        },
        Err(_) => {
            warnings.push(EnvValidationError {
                variable: "PAYLOG_PORT".to_string(),
                message: "Using default port 3000".to_string(),
                severity: ErrorSeverity::Info,
            });
            3000
        }
    };

    let bind_address = SocketAddr::new(
        host_ip.unwrap_or(IpAddr::from([0, 0, 0, 0])),
        port,
    );

    let upstream_url = env::var("PAYLOG_UPSTREAM_URL").unwrap_or_else(|_| {
        warnings.push(EnvValidationError {
            variable: "PAYLOG_UPSTREAM_URL".to_string(),
            message: "Using default upstream 'http://localhost:5000'".to_string(),
            severity: ErrorSeverity::Info,
        });
        "http://localhost:5000".to_string()
    });
    if !(upstream_url.starts_with("http://") || upstream_url.starts_with("https://")) {
        errors.push(EnvValidationError {
            variable: "PAYLOG_UPSTREAM_URL".to_string(),
            message: format!("Upstream URL must start with http:// or https://: {}", upstream_url),
            severity: ErrorSeverity::Critical,
        });
    }

    let trust_proxy = parse_bool_env_var_with_default("PAYLOG_TRUST_PROXY", false, &mut warnings);

    // Logging configuration
    if env::var("PAYLOG_LOG_LEVEL").is_err() && env::var("RUST_LOG").is_err() {
        warnings.push(EnvValidationError {
            variable: "RUST_LOG/PAYLOG_LOG_LEVEL".to_string(),
            message: format!("Using default log level '{}'", DEFAULT_LOG_FILTER),
            severity: ErrorSeverity::Info,
        });
    }
    let log_level = log_filter_directives();

    let log_dir = env::var("PAYLOG_LOG_DIR").unwrap_or_else(|_| {
        warnings.push(EnvValidationError {
            variable: "PAYLOG_LOG_DIR".to_string(),
            message: "Using default log directory 'logs'".to_string(),
            severity: ErrorSeverity::Info,
        });
        "logs".to_string()
    });
    if log_dir.trim().is_empty() {
        errors.push(EnvValidationError {
            variable: "PAYLOG_LOG_DIR".to_string(),
            message: "Log directory cannot be empty".to_string(),
            severity: ErrorSeverity::Critical,
        });
    }

    let console_color =
        parse_bool_env_var_with_default("PAYLOG_CONSOLE_COLOR", true, &mut warnings);

    // Rotation and thresholds
    let rotation_max_bytes = parse_env_var_with_default(
        "PAYLOG_ROTATION_MAX_BYTES",
        DEFAULT_MAX_LOG_BYTES,
        &mut warnings,
    );

    let rotation_interval_secs = parse_env_var_with_default(
        "PAYLOG_ROTATION_INTERVAL_SECS",
        DEFAULT_ROTATION_INTERVAL_SECONDS,
        &mut warnings,
    );
    if rotation_interval_secs == 0 {
        errors.push(EnvValidationError {
            variable: "PAYLOG_ROTATION_INTERVAL_SECS".to_string(),
            message: "Rotation interval must be at least 1 second".to_string(),
            severity: ErrorSeverity::Critical,
        });
    }

    let slow_request_ms = parse_env_var_with_default(
        "PAYLOG_SLOW_REQUEST_MS",
        DEFAULT_SLOW_REQUEST_MS,
        &mut warnings,
    );

    let slow_operation_ms = parse_env_var_with_default(
        "PAYLOG_SLOW_OPERATION_MS",
        DEFAULT_SLOW_OPERATION_MS,
        &mut warnings,
    );

    // Add all warnings to errors for reporting
    errors.extend(warnings);

    // Check if we have any critical errors
    let has_critical_errors = errors.iter().any(|e| e.severity == ErrorSeverity::Critical);

    if has_critical_errors {
        return Err(errors);
    }

    // Log non-critical issues
    for error in &errors {
        match error.severity {
            ErrorSeverity::Warning => warn!("{}: {}", error.variable, error.message),
            ErrorSeverity::Info => info!("{}: {}", error.variable, error.message),
            ErrorSeverity::Critical => {} // Already handled above
        }
    }

    Ok(AppConfig {
        host,
        port,
        bind_address,
        upstream_url,
        trust_proxy,
        log_level,
        log_dir: PathBuf::from(log_dir),
        console_color,
        rotation_max_bytes,
        rotation_interval_secs,
        slow_request_ms,
        slow_operation_ms,
    })
}

/// `tracing` filter directives: `PAYLOG_LOG_LEVEL`, then `RUST_LOG`, then the default.
/// Readable before validation so the subscriber can be installed first.
pub fn log_filter_directives() -> String {
    env::var("PAYLOG_LOG_LEVEL")
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}

/// Get the validated configuration, exiting if validation fails
pub fn get_config() -> AppConfig {
    match validate_environment() {
        Ok(config) => config,
        Err(errors) => {
            eprintln!("Environment validation failed:");
            for error in errors {
                match error.severity {
                    ErrorSeverity::Critical => {
                        eprintln!("CRITICAL - {}: {}", error.variable, error.message)
                    }
                    ErrorSeverity::Warning => {
                        eprintln!("WARNING - {}: {}", error.variable, error.message)
                    }
                    ErrorSeverity::Info => {
                        eprintln!("INFO - {}: {}", error.variable, error.message)
                    }
                }
            }
            std::process::exit(1);
        }
    }
}

/// Print environment validation results in a user-friendly format
pub fn print_validation_results(result: &Result<AppConfig, Vec<EnvValidationError>>) {
    match result {
        Ok(config) => {
            println!("Environment validation successful");
            println!("Configuration:");
            println!("  Server: {}", config.bind_address);
            println!("  Upstream: {}", config.upstream_url);
            println!("  Trust Proxy: {}", config.trust_proxy);
            println!("  Log Level: {}", config.log_level);
            println!("  Log Directory: {}", config.log_dir.display());
            println!("  Console Color: {}", config.console_color);
            println!(
                "  Rotation: files over {} bytes, every {}s",
                config.rotation_max_bytes, config.rotation_interval_secs
            );
            println!("  Slow Request Threshold: {}ms", config.slow_request_ms);
            println!("  Slow Operation Threshold: {}ms", config.slow_operation_ms);
        }
        Err(errors) => {
            let critical_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Critical)
                .count();
            let warning_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Warning)
                .count();
            let info_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Info)
                .count();

            eprintln!(
                "Environment validation failed with {} critical error(s), {} warning(s), \
                 {} info message(s):",
                critical_count, warning_count, info_count
            );

            for error in errors {
                let prefix = match error.severity {
                    ErrorSeverity::Critical => "CRITICAL",
                    ErrorSeverity::Warning => "WARNING",
                    ErrorSeverity::Info => "INFO",
                };
                println!("  {} - {}: {}", prefix, error.variable, error.message);
            }
        }
    }
}

/// Generate example environment configuration file
pub fn generate_env_example() -> String {
    format!(
        r#"# paylog Environment Configuration
# Copy this file to .env and customize the values for your deployment

# =============================================================================
# Server Configuration
# =============================================================================

# Server bind address
# Default: 0.0.0.0 (bind to all interfaces)
PAYLOG_HOST=0.0.0.0

# Server port
# Default: 3000
# Note: Ports below 1024 may require root privileges
PAYLOG_PORT=3000

# Payment API that requests are forwarded to
# Default: http://localhost:5000
PAYLOG_UPSTREAM_URL=http://localhost:5000

# Take the client address from X-Forwarded-For. Enable only behind a proxy
# that sets the header, otherwise clients can forge the logged address
# Default: false
PAYLOG_TRUST_PROXY=false

# =============================================================================
# Logging Configuration
# =============================================================================

# Diagnostic log filter
# Default: {filter}
# Examples:
#   RUST_LOG=debug                            # Everything at debug level
#   RUST_LOG=paylog=debug,tower_http=info     # Custom per-module levels
#   PAYLOG_LOG_LEVEL=info                     # Override for paylog only
RUST_LOG={filter}

# Directory holding payments.log, webhooks.log, api.log, firebase.log,
# performance.log and errors.log
# Default: logs
PAYLOG_LOG_DIR=logs

# Color console entries by level
# Default: true
PAYLOG_CONSOLE_COLOR=true

# =============================================================================
# Rotation and Thresholds
# =============================================================================

# Rotate category files larger than this many bytes
# Default: {max_bytes} (10 MiB)
PAYLOG_ROTATION_MAX_BYTES={max_bytes}

# Seconds between rotation sweeps
# Default: {interval} (1 hour)
PAYLOG_ROTATION_INTERVAL_SECS={interval}

# Requests slower than this (ms) also get a performance entry
# Default: {slow_request}
PAYLOG_SLOW_REQUEST_MS={slow_request}

# Timings slower than this (ms) print a console warning
# Default: {slow_operation}
PAYLOG_SLOW_OPERATION_MS={slow_operation}
"#,
        filter = DEFAULT_LOG_FILTER,
        max_bytes = DEFAULT_MAX_LOG_BYTES,
        interval = DEFAULT_ROTATION_INTERVAL_SECONDS,
        slow_request = DEFAULT_SLOW_REQUEST_MS,
        slow_operation = DEFAULT_SLOW_OPERATION_MS,
    )
}

/// Helper function to parse environment variable with default value
fn parse_env_var_with_default<T>(
    var_name: &str,
    default: T,
    warnings: &mut Vec<EnvValidationError>,
) -> T
where
    T: FromStr + Clone + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(var_name) {
        Ok(value_str) => match value_str.parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warnings.push(EnvValidationError {
                    variable: var_name.to_string(),
                    message: format!(
                        "Invalid value '{}': {}. Using default: {}",
                        value_str, e, default
                    ),
                    severity: ErrorSeverity::Warning,
                });
                default
            }
        },
        Err(_) => {
            warnings.push(EnvValidationError {
                variable: var_name.to_string(),
                message: format!("Using default value: {}", default),
                severity: ErrorSeverity::Info,
            });
            default
        }
    }
}

/// Helper function to parse boolean environment variable with default value
fn parse_bool_env_var_with_default(
    var_name: &str,
    default: bool,
    warnings: &mut Vec<EnvValidationError>,
) -> bool {
    match env::var(var_name) {
        Ok(value_str) => match value_str.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                warnings.push(EnvValidationError {
                    variable: var_name.to_string(),
                    message: format!(
                        "Invalid boolean value '{}'. Using default: {}",
                        value_str, default
                    ),
                    severity: ErrorSeverity::Warning,
                });
                default
            }
        },
        Err(_) => {
            warnings.push(EnvValidationError {
                variable: var_name.to_string(),
                message: format!("Using default value: {}", default),
                severity: ErrorSeverity::Info,
            });
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests mutate process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 12] = [
        "PAYLOG_HOST",
        "PAYLOG_PORT",
        "PAYLOG_UPSTREAM_URL",
        "PAYLOG_TRUST_PROXY",
        "PAYLOG_LOG_DIR",
        "PAYLOG_CONSOLE_COLOR",
        "PAYLOG_ROTATION_MAX_BYTES",
        "PAYLOG_ROTATION_INTERVAL_SECS",
        "PAYLOG_SLOW_REQUEST_MS",
        "PAYLOG_SLOW_OPERATION_MS",
        "PAYLOG_LOG_LEVEL",
        "RUST_LOG",
    ];

    fn clear_vars() {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_default_configuration() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();

        let result = validate_environment();
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream_url, "http://localhost:5000");
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(config.console_color);
        assert!(!config.trust_proxy);
        assert_eq!(config.log_level, DEFAULT_LOG_FILTER);
        assert_eq!(config.rotation_max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.rotation_interval(), Duration::from_secs(3600));
        assert_eq!(config.slow_request_threshold(), Duration::from_millis(1000));
        assert_eq!(config.slow_operation_ms, 1000);
    }

    #[test]
    fn test_custom_configuration() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe {
            env::set_var("PAYLOG_HOST", "127.0.0.1");
            env::set_var("PAYLOG_PORT", "8080");
            env::set_var("PAYLOG_LOG_DIR", "/tmp/paylog");
            env::set_var("PAYLOG_CONSOLE_COLOR", "off");
            env::set_var("PAYLOG_ROTATION_MAX_BYTES", "2048");
            env::set_var("PAYLOG_SLOW_REQUEST_MS", "250");
            env::set_var("PAYLOG_TRUST_PROXY", "true");
        }

        let result = validate_environment();
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1:8080".parse().unwrap());
        assert!(!config.console_color);
        assert!(config.trust_proxy);

        let logger_config = config.logger_config();
        assert_eq!(logger_config.log_dir, PathBuf::from("/tmp/paylog"));
        assert_eq!(logger_config.max_log_bytes, 2048);
        assert!(!logger_config.console_color);
        assert_eq!(config.slow_request_threshold(), Duration::from_millis(250));

        clear_vars();
    }

    #[test]
    fn test_invalid_port() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe {
            env::set_var("PAYLOG_PORT", "invalid");
        }

        let result = validate_environment();
        assert!(result.is_err());

        let errors = result.unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.variable == "PAYLOG_PORT" && e.severity == ErrorSeverity::Critical)
        );

        clear_vars();
    }

    #[test]
    fn test_invalid_host() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe {
            env::set_var("PAYLOG_HOST", "invalid-host");
        }

        let result = validate_environment();
        assert!(result.is_err());

        let errors = result.unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.variable == "PAYLOG_HOST" && e.severity == ErrorSeverity::Critical)
        );

        clear_vars();
    }

    #[test]
    fn test_invalid_upstream_and_interval() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe {
            env::set_var("PAYLOG_UPSTREAM_URL", "localhost:5000");
            env::set_var("PAYLOG_ROTATION_INTERVAL_SECS", "0");
        }

        let errors = validate_environment().unwrap_err();
        let critical: Vec<&str> = errors
            .iter()
            .filter(|e| e.severity == ErrorSeverity::Critical)
            .map(|e| e.variable.as_str())
            .collect();
        assert!(critical.contains(&"PAYLOG_UPSTREAM_URL"));
        assert!(critical.contains(&"PAYLOG_ROTATION_INTERVAL_SECS"));

        clear_vars();
    }

    #[test]
    fn test_invalid_numbers_fall_back_with_warning() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe {
            env::set_var("PAYLOG_ROTATION_MAX_BYTES", "ten megabytes");
            env::set_var("PAYLOG_CONSOLE_COLOR", "maybe");
        }

        let config = validate_environment().unwrap();
        assert_eq!(config.rotation_max_bytes, DEFAULT_MAX_LOG_BYTES);
        assert!(config.console_color);

        clear_vars();
    }

    #[test]
    fn test_env_example_mentions_every_variable() {
        let example = generate_env_example();
        for var in VARS {
            assert!(example.contains(var), "{} missing from example", var);
        }
        assert!(example.contains("PAYLOG_ROTATION_MAX_BYTES=10485760"));
    }

    #[test]
    fn test_log_filter_precedence() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        assert_eq!(log_filter_directives(), DEFAULT_LOG_FILTER);

        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
        assert_eq!(log_filter_directives(), "debug");

        unsafe {
            env::set_var("PAYLOG_LOG_LEVEL", "paylog=warn");
        }
        assert_eq!(log_filter_directives(), "paylog=warn");

        clear_vars();
    }
}
