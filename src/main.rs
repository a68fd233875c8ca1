// Entrypoint for the `compass` CLI.
// - Keeps `main` small: parse arguments, set up logging, hand over to
//   `commands::run`.
// - Any failure is logged on stderr and mapped to a non-zero exit code.

use clap::Parser;
use compass_cli::cli::Cli;
use compass_cli::{commands, logger};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_verbosity(cli.verbose));

    match commands::run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
