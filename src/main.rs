use clap::Parser;
use tracing::error;

use tickwatch::adapter::inbound::cli::command::Cli;
use tickwatch::adapter::inbound::cli::output::{self, Mode};
use tickwatch::adapter::inbound::cli;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    output::configure(Mode::from_flags(args.json, args.quiet));

    if let Err(e) = cli::execute(args).await {
        error!(error = %e, "Fatal error");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
