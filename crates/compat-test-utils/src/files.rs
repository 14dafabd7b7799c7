//! Scenario files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// The `scenarios/` directory at the workspace root.
pub fn scenarios_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .canonicalize()
        .expect("scenarios/ directory should exist at the workspace root")
}

/// Every `*.toml` file in [`scenarios_dir`], sorted by name.
pub fn bundled_scenarios() -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(scenarios_dir())
        .expect("failed to read scenarios/")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    files
}

/// A temporary directory for writing scenario and config files.
pub struct ScenarioDir {
    temp_dir: TempDir,
}

impl Default for ScenarioDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` under the root and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
