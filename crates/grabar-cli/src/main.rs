//! Grabar CLI entry point.

use clap::Parser;
use grabar_cli::commands::{self, Cli, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    grabar_cli::logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> grabar_cli::CliResult<()> {
    match &cli.command {
        Commands::Generate(args) => commands::run_generate(cli.format, args),
        Commands::Update(args) => commands::run_update(cli.format, args),
        Commands::Refine(args) => commands::run_refine(cli.format, args),
        Commands::Inspect(args) => commands::run_inspect(cli.format, args),
        Commands::List(args) => commands::run_list(cli.format, args),
    }
}
