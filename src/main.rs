// Entrypoint for the demo client.
// - Keeps `main` small: parse flags, set up logging, validate, run.
// - Returns `anyhow::Result` so startup and loop errors end the process
//   with a message on stderr and a non-zero exit code.

use clap::Parser;
use context_api_demo::{app, cli, cli::Cli, config::Config, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));
    logging::configure_logging(cli.verbose);

    // Fails before any network activity when no api key is given.
    let config = Config::from_cli(cli)?;

    app::run(&config)
}
