mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, list, locate};
use portfind_common::network::target::Query;
use terminal::logging;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Must run before clap reads `env` fallbacks.
    dotenvy::dotenv().ok();

    let commands = CommandLine::parse_args();
    logging::init(commands.global.verbose);

    match run(commands).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(commands: CommandLine) -> anyhow::Result<()> {
    let args = &commands.global;
    match commands.command {
        Commands::Locate { query } => locate::locate(query, args).await,
        Commands::Table => locate::locate(Query::full_table(), args).await,
        Commands::Orgs => list::orgs(args).await,
        Commands::Networks => list::networks(args).await,
        Commands::Check => list::check(args).await,
    }
}
