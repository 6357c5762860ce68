mod classifier;
mod cli;
mod error;
mod export;
mod fields;
#[cfg(test)]
mod fixtures;
mod fmt;
mod importer;
mod models;
mod parser;
mod reconciler;
mod reports;
mod settings;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use cli::{Cli, Commands, ConfigCommands};

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::OFF
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            format,
        } => cli::convert::run(&input, output.as_deref(), format, quiet),
        Commands::Check { input } => cli::convert::check(&input, quiet),
        Commands::Classify { input, all } => cli::classify::run(&input, all),
        Commands::Field {
            input,
            row,
            field,
            required,
        } => cli::field::run(&input, row, &field, required),
        Commands::Config { command } => match command {
            ConfigCommands::Show { config } => cli::config::show(config.as_deref()),
            ConfigCommands::Init { path, force } => cli::config::init(path.as_deref(), force),
            ConfigCommands::Path => cli::config::path(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
