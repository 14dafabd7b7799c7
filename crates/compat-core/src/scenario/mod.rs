//! Declarative scenario files.
//!
//! A scenario declares a spec vocabulary and a set of product aliases, then
//! a sequence of version puts, with optional expectations on each step's
//! outcome and on the final state of each product. Scenarios are replayed
//! against a fresh [`Store`](crate::Store) by the [`ScenarioRunner`].
//!
//! # Example
//!
//! ```
//! use compat_core::scenario::Scenario;
//!
//! let scenario = Scenario::parse(r#"
//! specs = ["spec1", "spec2"]
//! products = ["p0", "p1"]
//!
//! [[step]]
//! product = "p0"
//! version = "p0-v1"
//! supports = ["spec1"]
//!
//! [[step]]
//! product = "p1"
//! supports = ["spec1", "spec2"]
//! dependencies = ["p0"]
//! expect = "rejected"
//!
//! [expect.p1]
//! compatible = []
//! "#).unwrap();
//!
//! assert_eq!(scenario.steps.len(), 2);
//! ```

mod runner;

pub use runner::{
    ExpectationResult, Replay, ScenarioReport, ScenarioRunner, StepOutcome, StepResult,
};

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineOverrides;
use crate::error::{Error, Result};
use crate::spec::{SpecRegistry, SpecSet, SpecTag};

/// Expected outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedOutcome {
    Accepted,
    Rejected,
}

/// One version put.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Alias of the owning product.
    pub product: String,
    /// Version alias. A new alias creates a version; a reused one updates it.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub supports: Vec<SpecTag>,
    /// Aliases of the products this version depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub expect: Option<ExpectedOutcome>,
}

impl Step {
    pub fn supports_set(&self) -> SpecSet {
        self.supports.iter().cloned().collect()
    }
}

/// Expected final state of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductExpectation {
    pub compatible: Vec<SpecTag>,
    /// Version aliases in insertion order, if checked.
    #[serde(default)]
    pub versions: Option<Vec<String>>,
}

/// A parsed scenario file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// The spec vocabulary.
    #[serde(default)]
    pub specs: Vec<SpecTag>,
    /// Product aliases, created in this order.
    #[serde(default)]
    pub products: Vec<String>,
    /// Engine settings layered over the config file.
    #[serde(default)]
    pub engine: EngineOverrides,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    /// Expected final state keyed by product alias.
    #[serde(default)]
    pub expect: BTreeMap<String, ProductExpectation>,
}

impl Scenario {
    /// Parse and validate a scenario from TOML.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` for malformed TOML, and `Error::UnknownSpec`,
    /// `Error::UnknownAlias` or `Error::DuplicateAlias` for references the
    /// scenario does not declare.
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file.
    ///
    /// A scenario without a `name` is named after the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut scenario = Self::parse(&content)?;
        if scenario.name.is_none() {
            scenario.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(scenario)
    }

    /// Display name, falling back to `"scenario"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("scenario")
    }

    /// The declared vocabulary as a registry.
    pub fn registry(&self) -> SpecRegistry {
        self.specs.iter().cloned().collect()
    }

    /// Check that every referenced spec and product alias is declared.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for alias in &self.products {
            if !seen.insert(alias.as_str()) {
                return Err(Error::DuplicateAlias {
                    alias: alias.clone(),
                });
            }
        }

        let registry = self.registry();
        let check_specs = |tags: &[SpecTag], context: String| -> Result<()> {
            let set: SpecSet = tags.iter().cloned().collect();
            match registry.unknown_in(&set).first() {
                Some(tag) => Err(Error::UnknownSpec {
                    tag: (*tag).clone(),
                    context,
                }),
                None => Ok(()),
            }
        };
        let check_alias = |alias: &str, context: String| -> Result<()> {
            if seen.contains(alias) {
                Ok(())
            } else {
                Err(Error::UnknownAlias {
                    alias: alias.to_string(),
                    context,
                })
            }
        };

        for (index, step) in self.steps.iter().enumerate() {
            let context = format!("step {}", index + 1);
            check_alias(&step.product, context.clone())?;
            for dependency in &step.dependencies {
                check_alias(dependency, context.clone())?;
            }
            check_specs(&step.supports, context)?;
        }

        for (alias, expectation) in &self.expect {
            let context = format!("expectation for '{alias}'");
            check_alias(alias, context.clone())?;
            check_specs(&expectation.compatible, context)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelfDependencyPolicy;

    const BASIC: &str = r#"
name = "basic"
specs = ["spec1", "spec2"]
products = ["p0", "p1"]

[engine]
self_dependency = "allow"

[[step]]
product = "p0"
version = "v0"
supports = ["spec1"]

[[step]]
product = "p1"
supports = ["spec1"]
dependencies = ["p0"]
expect = "accepted"

[expect.p1]
compatible = ["spec1"]
"#;

    #[test]
    fn test_parse_basic() {
        let scenario = Scenario::parse(BASIC).unwrap();

        assert_eq!(scenario.display_name(), "basic");
        assert_eq!(scenario.products, vec!["p0", "p1"]);
        assert_eq!(scenario.engine.self_dependency, Some(SelfDependencyPolicy::Allow));
        assert_eq!(scenario.steps[0].version.as_deref(), Some("v0"));
        assert!(scenario.steps[0].dependencies.is_empty());
        assert_eq!(scenario.steps[1].expect, Some(ExpectedOutcome::Accepted));
        assert_eq!(scenario.expect["p1"].compatible, vec![SpecTag::new("spec1")]);
    }

    #[test]
    fn test_unknown_spec_is_rejected() {
        let content = r#"
specs = ["spec1"]
products = ["p0"]

[[step]]
product = "p0"
supports = ["spec7"]
"#;
        let err = Scenario::parse(content).unwrap_err();
        assert!(matches!(err, Error::UnknownSpec { ref tag, .. } if tag.as_str() == "spec7"));
    }

    #[test]
    fn test_unknown_dependency_alias_is_rejected() {
        let content = r#"
specs = ["spec1"]
products = ["p0"]

[[step]]
product = "p0"
supports = ["spec1"]
dependencies = ["ghost"]
"#;
        let err = Scenario::parse(content).unwrap_err();
        assert!(matches!(err, Error::UnknownAlias { ref alias, .. } if alias == "ghost"));
    }

    #[test]
    fn test_duplicate_product_alias_is_rejected() {
        let content = r#"
products = ["p0", "p0"]
"#;
        let err = Scenario::parse(content).unwrap_err();
        assert!(matches!(err, Error::DuplicateAlias { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let content = r#"
products = ["p0"]

[[step]]
product = "p0"
suports = ["spec1"]
"#;
        assert!(matches!(Scenario::parse(content), Err(Error::TomlDe(_))));
    }

    #[test]
    fn test_load_names_scenario_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle.toml");
        std::fs::write(&path, "products = [\"p0\"]\n").unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.display_name(), "cycle");
    }
}
