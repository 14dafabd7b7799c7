//! Run and check command implementations

use std::path::{Path, PathBuf};

use colored::Colorize;
use compat_core::scenario::{ScenarioReport, StepOutcome, StepResult};
use compat_core::{ConfigResolver, EngineOverrides, Scenario, ScenarioRunner, format_set};

use crate::error::{CliError, Result};

/// Replay each file and print a step-by-step report.
///
/// With `json`, all reports are written to stdout as one JSON array.
pub fn run_scenarios(
    files: &[PathBuf],
    resolver: &ConfigResolver,
    overrides: &EngineOverrides,
    json: bool,
) -> Result<()> {
    let reports = replay_all(files, resolver, overrides)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    summarize(&reports)
}

/// Replay each file and print one pass/fail line per scenario.
pub fn run_check(
    files: &[PathBuf],
    resolver: &ConfigResolver,
    overrides: &EngineOverrides,
) -> Result<()> {
    let reports = replay_all(files, resolver, overrides)?;

    for report in &reports {
        if report.passed() {
            println!("{} {}", "PASS".green().bold(), report.name);
        } else {
            println!(
                "{} {} ({} failures)",
                "FAIL".red().bold(),
                report.name,
                report.failure_count()
            );
        }
    }

    summarize(&reports)
}

fn replay_all(
    files: &[PathBuf],
    resolver: &ConfigResolver,
    overrides: &EngineOverrides,
) -> Result<Vec<ScenarioReport>> {
    let runner = ScenarioRunner::new()
        .with_resolver(resolver.clone())
        .with_overrides(overrides.clone());

    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        reports.push(replay_file(&runner, file)?);
    }
    Ok(reports)
}

fn replay_file(runner: &ScenarioRunner, file: &Path) -> Result<ScenarioReport> {
    tracing::debug!(?file, "Loading scenario");
    let scenario = Scenario::load(file)
        .map_err(|e| CliError::user(format!("{}: {}", file.display(), e)))?;
    Ok(runner.run(&scenario)?)
}

fn summarize(reports: &[ScenarioReport]) -> Result<()> {
    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} of {} scenarios failed",
            failed,
            reports.len()
        )))
    }
}

fn print_report(report: &ScenarioReport) {
    println!(
        "{} {} ({} = {})",
        "Scenario".bold(),
        report.name.cyan(),
        "self_dependency".dimmed(),
        report.config.self_dependency
    );

    for step in &report.steps {
        print_step(step);
    }

    if !report.expectations.is_empty() {
        println!();
        println!("{}:", "Expectations".bold());
        for expectation in &report.expectations {
            if expectation.passed() {
                println!(
                    "  {} {} = {}",
                    "+".green(),
                    expectation.product,
                    format_set(&expectation.actual_compatible)
                );
            } else {
                println!(
                    "  {} {}: expected {}, got {}",
                    "x".red(),
                    expectation.product,
                    format_set(&expectation.expected_compatible),
                    format_set(&expectation.actual_compatible)
                );
                if let Some(versions) = &expectation.expected_versions
                    && versions != &expectation.actual_versions
                {
                    println!(
                        "      versions: expected {:?}, got {:?}",
                        versions, expectation.actual_versions
                    );
                }
            }
        }
    }

    println!();
    println!("{}:", "Final sets".bold());
    for (alias, set) in &report.products {
        println!("  {} {}", alias.cyan(), format_set(set));
    }

    if !report.audit.is_consistent() {
        println!();
        println!("{}:", "Stale products".red().bold());
        for stale in report.audit.stale() {
            println!(
                "  {} stored {}, derived {}",
                stale.product,
                format_set(&stale.stored),
                format_set(&stale.derived)
            );
        }
    }

    println!();
    if report.passed() {
        println!("{}", "passed".green().bold());
    } else {
        println!(
            "{} ({} failures)",
            "failed".red().bold(),
            report.failure_count()
        );
    }
    println!();
}

fn print_step(step: &StepOutcome) {
    let marker = if step.passed() {
        "+".green()
    } else {
        "x".red()
    };
    let target = match &step.version {
        Some(alias) => format!("{}/{}", step.product, alias),
        None => step.product.clone(),
    };

    match &step.result {
        StepResult::Accepted {
            created, changed, ..
        } => {
            let action = if *created { "created" } else { "updated" };
            let changed = if changed.is_empty() {
                "no changes".dimmed().to_string()
            } else {
                format!("changed: {}", changed.join(", "))
            };
            println!(
                "  {} [{}] {} {} ({})",
                marker,
                step.index,
                target,
                action.green(),
                changed
            );
        }
        StepResult::Rejected { disallowed } => {
            println!(
                "  {} [{}] {} {} (disallowed {})",
                marker,
                step.index,
                target,
                "rejected".yellow(),
                format_set(disallowed)
            );
        }
    }

    if !step.passed()
        && let Some(expected) = step.expected
    {
        println!("      expected {:?}", expected);
    }
}
