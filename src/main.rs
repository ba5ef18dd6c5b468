use paylog::cli::parse_cli_commands;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match parse_cli_commands().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("paylog: {}", e);
            ExitCode::FAILURE
        }
    }
}
