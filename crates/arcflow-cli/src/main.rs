//! Arcflow CLI - Command-line utility for streaming archive
//! extraction and compression.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let formatter = output::create_formatter(cli.json, cli.quiet);

    match &cli.command {
        cli::Commands::Extract(args) => {
            commands::extract::execute(args, &*formatter, cli.quiet, cli.json)
        }
        cli::Commands::Create(args) => {
            commands::create::execute(args, &*formatter, cli.quiet, cli.json)
        }
        cli::Commands::List(args) => commands::list::execute(args, &*formatter),
    }
}
