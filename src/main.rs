// Entrypoint for the CLI.
// - Keeps `main` small: parse arguments, set up logging, build the client
//   and dispatch to the matching handler in `ui`.
// - Any error ends the process with a non-zero status.

use clap::Parser;
use crxpkg::config::{Cli, Command};
use crxpkg::{logging, ui};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let client = ui::connect(&cli.connection)?;
    let url = &cli.connection.url;

    match &cli.command {
        Command::Upload(args) => ui::handle_upload(&client, url, args),
        Command::Install(args) => ui::handle_install(&client, url, args),
    }
}
