// Single-purpose binary: log in and print the news feed.

use clap::Parser;
use compass_cli::cli::{Command, NewsCli};
use compass_cli::{commands, logger};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = NewsCli::parse();
    logger::init_logger(logger::level_from_verbosity(cli.verbose));

    match commands::run(&Command::NewsFeed(cli.portal)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
