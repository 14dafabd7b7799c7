//! Command implementations for compat-cli

pub mod run;
pub mod specs;

use std::path::Path;

use compat_core::ConfigResolver;

pub use run::{run_check, run_scenarios};
pub use specs::run_specs;

/// Pick the config file layer: an explicit `--config` path must exist,
/// otherwise `compat.toml` in the working directory is used when present.
pub fn resolver(cwd: &Path, config: Option<&Path>) -> ConfigResolver {
    match config {
        Some(path) => ConfigResolver::with_file(cwd.join(path)),
        None => ConfigResolver::discover(cwd),
    }
}
