mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::Cli;
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let envelope = commands::run(&cli)?;
    output::render(&envelope, cli.pretty)?;

    Ok(())
}
