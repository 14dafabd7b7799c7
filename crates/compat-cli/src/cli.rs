//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use compat_core::{EngineOverrides, SelfDependencyPolicy};

/// Compat Tracker - Derive and audit product spec compatibility
#[derive(Parser, Debug)]
#[command(name = "compat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (defaults to ./compat.toml when present)
    #[arg(short, long, global = true, env = "COMPAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Engine settings that override the config file and the scenario
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineArgs {
    /// Policy for versions depending on their own product (reject or allow)
    #[arg(long, value_parser = parse_policy)]
    pub self_dependency: Option<SelfDependencyPolicy>,

    /// Audit the whole store after every accepted version
    #[arg(long)]
    pub audit_after_commit: bool,
}

impl EngineArgs {
    pub fn overrides(&self) -> EngineOverrides {
        EngineOverrides {
            self_dependency: self.self_dependency,
            audit_after_commit: self.audit_after_commit.then_some(true),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Replay scenario files and show every step
    ///
    /// Examples:
    ///   compat run scenarios/cycle.toml
    ///   compat run scenarios/*.toml --json
    ///   compat run my.toml --self-dependency allow
    Run {
        /// Scenario files to replay
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output reports as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Replay scenario files and report pass/fail only
    Check {
        /// Scenario files to replay
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List the spec vocabulary and products declared by a scenario
    Specs {
        /// Scenario file to inspect
        file: PathBuf,
    },
}

fn parse_policy(value: &str) -> Result<SelfDependencyPolicy, String> {
    value.parse().map_err(|e: compat_core::Error| e.to_string())
}
