use chat::cli::Cli;
use chat::telemetry;
use clap::Parser;
use std::process::ExitCode;
use tracing::{dispatcher, error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (directive, output) = cli.log_settings();
    telemetry::init_once(directive, output);

    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if dispatcher::has_been_set() {
                error!("{e}");
            } else {
                eprintln!("chat: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
