//! Engine configuration and its layered resolution.
//!
//! Configuration is merged from up to four layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A config file (`compat.toml`, or a path given explicitly)
//! 3. The `[engine]` table of a scenario file
//! 4. Command-line overrides
//!
//! Every layer after the first is an [`EngineOverrides`] in which unset
//! fields leave the value below untouched.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "compat.toml";

/// What to do with a version that lists its own product as a dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfDependencyPolicy {
    /// Refuse with `Error::SelfDependency`.
    #[default]
    Reject,
    /// Treat the product like any other dependency, reading its stored set.
    Allow,
}

impl fmt::Display for SelfDependencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Allow => f.write_str("allow"),
        }
    }
}

impl FromStr for SelfDependencyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" => Ok(Self::Allow),
            other => Err(Error::InvalidConfig {
                message: format!("self_dependency must be 'reject' or 'allow', got '{other}'"),
            }),
        }
    }
}

/// Fully resolved engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub self_dependency: SelfDependencyPolicy,
    /// Run the consistency audit after every accepted version.
    pub audit_after_commit: bool,
}

/// A partial configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_dependency: Option<SelfDependencyPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_after_commit: Option<bool>,
}

impl EngineOverrides {
    /// Apply the set fields of this layer on top of `config`.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if let Some(policy) = self.self_dependency {
            config.self_dependency = policy;
        }
        if let Some(audit) = self.audit_after_commit {
            config.audit_after_commit = audit;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.self_dependency.is_none() && self.audit_after_commit.is_none()
    }
}

/// On-disk shape of a config file.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineOverrides,
}

impl ConfigFile {
    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Resolves an [`EngineConfig`] from defaults, a config file, and overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    file: Option<PathBuf>,
    required: bool,
}

impl ConfigResolver {
    /// A resolver with no config file layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit config file. A missing file is an error.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            required: true,
        }
    }

    /// Use `<dir>/compat.toml` if it exists.
    pub fn discover(dir: &Path) -> Self {
        Self {
            file: Some(dir.join(CONFIG_FILENAME)),
            required: false,
        }
    }

    /// Merge defaults, the config file, then `overrides` in order.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` for a missing explicit file and
    /// `Error::TomlDe` for invalid TOML in the file.
    pub fn resolve(&self, overrides: &[&EngineOverrides]) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(path) = &self.file {
            if path.is_file() {
                tracing::debug!(?path, "Loading engine config file");
                let content = fs::read_to_string(path)?;
                ConfigFile::parse(&content)?.engine.apply_to(&mut config);
            } else if self.required {
                return Err(Error::ConfigNotFound { path: path.clone() });
            } else {
                tracing::debug!(?path, "No engine config file found, skipping");
            }
        }

        for layer in overrides {
            layer.apply_to(&mut config);
        }

        Ok(config)
    }
}
