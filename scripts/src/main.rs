use clap::Parser;
use scripts::{cli::Cli, errors::ScriptError};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().pretty().with_max_level(Level::from(cli.verbosity)).init();

    let config = cli.config();
    cli.command.run(&config).await
}
