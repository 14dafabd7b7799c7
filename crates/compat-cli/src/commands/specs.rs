//! Specs command implementation

use std::path::Path;

use colored::Colorize;
use compat_core::Scenario;

use crate::error::{CliError, Result};

/// Print the spec vocabulary and product aliases declared by a scenario.
pub fn run_specs(file: &Path) -> Result<()> {
    let scenario = Scenario::load(file)
        .map_err(|e| CliError::user(format!("{}: {}", file.display(), e)))?;

    println!("{} {}", "Scenario".bold(), scenario.display_name().cyan());
    if let Some(description) = &scenario.description {
        println!("{}", description.dimmed());
    }
    println!();

    let registry = scenario.registry();
    println!("{} ({}):", "Specs".bold(), registry.len());
    if registry.is_empty() {
        println!("  {}", "None".dimmed());
    } else {
        for tag in registry.known() {
            println!("  {} {}", "+".green(), tag);
        }
    }
    println!();

    println!("{}:", "Products".bold());
    if scenario.products.is_empty() {
        println!("  {}", "None".dimmed());
    } else {
        for alias in &scenario.products {
            println!("  {} {}", "+".green(), alias.cyan());
        }
    }

    Ok(())
}
