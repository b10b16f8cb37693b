//! Storefront command line

#![expect(clippy::print_stdout, reason = "commands write their results to stdout")]

use std::process;

use crate::cli::Cli;

mod cli;
mod config;
mod observability;

#[tokio::main]
#[expect(clippy::exit, reason = "failures end the process with a non-zero status")]
pub async fn main() {
    let cli = Cli::load();

    if let Err(error) = observability::init(&cli.settings.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging is not initialized, must use eprintln"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        #[expect(clippy::print_stderr, reason = "command errors go to stderr")]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }
}
