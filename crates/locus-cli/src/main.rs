//! Locus CLI: selector scoring, generation and scripted waits
//!
//! ## Usage
//!
//! ```bash
//! locus score css "#login"              # Score a locator
//! locus generate button.yaml            # Rank candidate selectors
//! locus smart click                     # Show the smart-wait condition
//! locus check request.yaml              # Validate a wait request
//! locus wait page.yaml request.yaml     # Run a wait (exit 2 on timeout)
//! ```

use clap::Parser;
use locus_cli::{handlers, logging, Cli, CliConfig, CliResult, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init_logging(&config);

    let mut out = std::io::stdout().lock();
    match &cli.command {
        Commands::Score(args) => handlers::score(&config, args, &mut out),
        Commands::Generate(args) => handlers::generate(&config, args, &mut out),
        Commands::Smart(args) => handlers::smart(&config, args, &mut out),
        Commands::Check(args) => handlers::check(&config, args, &mut out),
        Commands::Wait(args) => handlers::wait(&config, args, &mut out),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_format(cli.format.into())
        .with_log_json(cli.log_json)
}
