//! Command-line shell over the monitoring engine.

pub mod alerts;
pub mod command;
pub mod output;
pub mod paths;
pub mod portfolio;
pub mod run;
pub mod session;
pub mod validate;

use crate::error::Result;
use command::{Cli, Commands};
use session::Session;

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns whatever the selected handler fails with.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => run::execute(config, &args).await,
        Commands::Validate => validate::execute(config),
        Commands::Add(arg) => portfolio::add(&Session::open(config).await?, &arg.ticker).await,
        Commands::Remove(arg) => {
            portfolio::remove(&Session::open(config).await?, &arg.ticker).await
        }
        Commands::List => portfolio::list(&Session::open(config).await?).await,
        Commands::Check(args) => {
            alerts::check(&Session::open(config).await?, args.ticker.as_deref()).await
        }
        Commands::Cycle => alerts::cycle(&Session::open(config).await?).await,
        Commands::Outlook(args) => {
            alerts::outlook(&Session::open(config).await?, &args.ticker, args.send).await
        }
    }
}
