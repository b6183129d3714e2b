// ABOUTME: Entry point for the ekp CLI
// ABOUTME: Loads .env, sets up logging, and dispatches the parsed command

use anyhow::Result;
use clap::Parser;
use ekp_cli::commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Interactive chat owns the terminal, so its logs go to a file
    if matches!(cli.command, Command::Chat { .. }) {
        ekp_log::init_file("ekp");
    } else if cli.verbose {
        ekp_log::init();
    } else {
        ekp_log::init_for("ekp_cli");
    }

    ekp_cli::run_command(cli).await
}
