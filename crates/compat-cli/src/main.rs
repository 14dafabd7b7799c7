//! Compat Tracker CLI
//!
//! Replays scenario files against the compatibility engine and audits the
//! resulting store.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("{}: tracing subscriber already set", "warning".yellow());
        }
        tracing::debug!("Verbose mode enabled");
    }

    let cwd = std::env::current_dir()?;
    let resolver = commands::resolver(&cwd, cli.config.as_deref());

    match cli.command {
        Some(Commands::Run {
            files,
            json,
            engine,
        }) => commands::run_scenarios(&files, &resolver, &engine.overrides(), json),
        Some(Commands::Check { files, engine }) => {
            commands::run_check(&files, &resolver, &engine.overrides())
        }
        Some(Commands::Specs { file }) => commands::run_specs(&file),
        None => {
            // No command provided - show help hint
            println!("{} Compat Tracker CLI", "compat".green().bold());
            println!();
            println!("Run {} for available commands.", "compat --help".cyan());
            Ok(())
        }
    }
}
