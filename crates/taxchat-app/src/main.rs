use anyhow::Result;
use clap::Parser;

use taxchat::{execute_command, run_repl_mode, setup_from_cli, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let ctx = setup_from_cli(&cli)?;

    // If a subcommand was provided, execute it and exit
    if let Some(command) = &cli.command {
        let output = execute_command(&cli, command, &ctx).await?;
        println!("{}", output);
        return Ok(());
    }

    run_repl_mode(&ctx).await
}
