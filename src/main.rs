use std::process::ExitCode;

use ai_llm_service::telemetry;
use clap::Parser;
use colored::Colorize;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();
    if let Err(e) = telemetry::init("info", cli.verbose) {
        eprintln!("logging disabled: {e}");
    }

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
