//! Replaying scenarios against a fresh store.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{ExpectedOutcome, Scenario};
use crate::admission::Admission;
use crate::audit::{self, AuditReport};
use crate::config::{ConfigResolver, EngineConfig, EngineOverrides};
use crate::error::{Error, Result};
use crate::ids::{ProductId, SequentialIds, VersionId};
use crate::spec::SpecSet;
use crate::store::Store;

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepResult {
    Accepted {
        version: VersionId,
        created: bool,
        /// Aliases of the products whose set changed, in commit order.
        changed: Vec<String>,
    },
    Rejected {
        disallowed: SpecSet,
    },
}

impl StepResult {
    pub fn outcome(&self) -> ExpectedOutcome {
        match self {
            Self::Accepted { .. } => ExpectedOutcome::Accepted,
            Self::Rejected { .. } => ExpectedOutcome::Rejected,
        }
    }
}

/// A replayed step with its expectation, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// 1-based position in the scenario.
    pub index: usize,
    pub product: String,
    pub version: Option<String>,
    pub result: StepResult,
    pub expected: Option<ExpectedOutcome>,
}

impl StepOutcome {
    /// `true` when there is no expectation or it was met.
    pub fn passed(&self) -> bool {
        self.expected.is_none_or(|want| want == self.result.outcome())
    }
}

/// A final-state expectation checked against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub product: String,
    pub expected_compatible: SpecSet,
    pub actual_compatible: SpecSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_versions: Option<Vec<String>>,
    pub actual_versions: Vec<String>,
}

impl ExpectationResult {
    pub fn passed(&self) -> bool {
        self.expected_compatible == self.actual_compatible
            && self
                .expected_versions
                .as_ref()
                .is_none_or(|want| want == &self.actual_versions)
    }
}

/// Everything observed while replaying one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub config: EngineConfig,
    pub steps: Vec<StepOutcome>,
    pub expectations: Vec<ExpectationResult>,
    /// Final compatible set of every product, by alias.
    pub products: BTreeMap<String, SpecSet>,
    pub audit: AuditReport,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepOutcome::passed)
            && self.expectations.iter().all(ExpectationResult::passed)
            && self.audit.is_consistent()
    }

    /// Number of failed step expectations, final-state expectations, and
    /// stale products combined.
    pub fn failure_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.passed()).count()
            + self.expectations.iter().filter(|e| !e.passed()).count()
            + self.audit.stale().len()
    }
}

/// The store left behind by a replay, with its alias tables.
#[derive(Debug)]
pub struct Replay {
    pub store: Store,
    pub products: BTreeMap<String, ProductId>,
    pub versions: HashMap<String, VersionId>,
    pub report: ScenarioReport,
}

impl Replay {
    pub fn product(&self, alias: &str) -> Option<ProductId> {
        self.products.get(alias).copied()
    }

    pub fn version(&self, alias: &str) -> Option<VersionId> {
        self.versions.get(alias).copied()
    }
}

/// Replays scenarios, each against its own store.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    resolver: ConfigResolver,
    overrides: EngineOverrides,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a config file layer.
    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Overrides applied after the scenario's own `[engine]` table.
    pub fn with_overrides(mut self, overrides: EngineOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replay a scenario and return its report.
    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioReport> {
        self.replay(scenario).map(|replay| replay.report)
    }

    /// Replay a scenario, keeping the resulting store.
    ///
    /// # Errors
    ///
    /// Precondition violations raised by a step (owner mismatch, forbidden
    /// self-dependency) abort the replay. Inadmissible versions do not:
    /// they are recorded as rejected steps.
    pub fn replay(&self, scenario: &Scenario) -> Result<Replay> {
        scenario.validate()?;
        let config = self.resolver.resolve(&[&scenario.engine, &self.overrides])?;
        let name = scenario.display_name().to_string();
        tracing::debug!(scenario = %name, ?config, "Replaying scenario");

        let mut store = Store::with_id_source(SequentialIds::new()).with_config(config.clone());
        let mut products: BTreeMap<String, ProductId> = BTreeMap::new();
        let mut aliases: HashMap<ProductId, String> = HashMap::new();
        for alias in &scenario.products {
            let id = store.create_product();
            products.insert(alias.clone(), id);
            aliases.insert(id, alias.clone());
        }

        let mut versions: HashMap<String, VersionId> = HashMap::new();
        let mut steps = Vec::with_capacity(scenario.steps.len());

        for (position, step) in scenario.steps.iter().enumerate() {
            let index = position + 1;
            let product = lookup(&products, &step.product, index)?;
            let dependencies = step
                .dependencies
                .iter()
                .map(|alias| lookup(&products, alias, index))
                .collect::<Result<Vec<_>>>()?;
            let version = step
                .version
                .as_ref()
                .and_then(|alias| versions.get(alias).copied());

            let admission =
                store.put_version(product, version, step.supports_set(), dependencies)?;

            let result = match admission {
                Admission::Accepted(accepted) => {
                    if let Some(alias) = &step.version {
                        versions.insert(alias.clone(), accepted.version);
                    }
                    let changed = accepted
                        .cascade
                        .changed_products()
                        .into_iter()
                        .map(|id| alias_of(&aliases, id))
                        .collect();
                    StepResult::Accepted {
                        version: accepted.version,
                        created: accepted.created,
                        changed,
                    }
                }
                Admission::Rejected(rejection) => StepResult::Rejected {
                    disallowed: rejection.disallowed,
                },
            };

            let outcome = StepOutcome {
                index,
                product: step.product.clone(),
                version: step.version.clone(),
                result,
                expected: step.expect,
            };
            if !outcome.passed() {
                tracing::warn!(scenario = %name, step = index, "Step expectation not met");
            }
            steps.push(outcome);
        }

        let version_aliases: HashMap<VersionId, &str> = versions
            .iter()
            .map(|(alias, id)| (*id, alias.as_str()))
            .collect();

        let mut expectations = Vec::with_capacity(scenario.expect.len());
        for (alias, expectation) in &scenario.expect {
            let id = lookup(&products, alias, 0)?;
            let record = store.require_product(id)?;
            let actual_versions = record
                .versions()
                .iter()
                .map(|v| {
                    version_aliases
                        .get(v)
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| v.to_string())
                })
                .collect();
            expectations.push(ExpectationResult {
                product: alias.clone(),
                expected_compatible: expectation.compatible.iter().cloned().collect(),
                actual_compatible: record.compatible().clone(),
                expected_versions: expectation.versions.clone(),
                actual_versions,
            });
        }

        let audit = audit::check_consistency(&store)?;
        let mut final_sets = BTreeMap::new();
        for (alias, id) in &products {
            final_sets.insert(alias.clone(), store.compatible(*id)?.clone());
        }

        let report = ScenarioReport {
            name,
            config,
            steps,
            expectations,
            products: final_sets,
            audit,
        };

        Ok(Replay {
            store,
            products,
            versions,
            report,
        })
    }
}

fn lookup(products: &BTreeMap<String, ProductId>, alias: &str, step: usize) -> Result<ProductId> {
    products.get(alias).copied().ok_or_else(|| Error::UnknownAlias {
        alias: alias.to_string(),
        context: if step == 0 {
            "expectations".to_string()
        } else {
            format!("step {step}")
        },
    })
}

fn alias_of(aliases: &HashMap<ProductId, String>, id: ProductId) -> String {
    aliases.get(&id).cloned().unwrap_or_else(|| id.to_string())
}
