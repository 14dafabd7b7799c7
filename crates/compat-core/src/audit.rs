//! Consistency auditing and store snapshots.
//!
//! Two checks back scenario-based testing:
//! - every stored compatible set must equal a fresh derivation
//! - the full store state must equal an expected [`StoreSnapshot`]

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::derive_compatibility;
use crate::error::Result;
use crate::ids::{ProductId, VersionId};
use crate::model::{Product, Version};
use crate::spec::{SpecSet, format_set};
use crate::store::Store;

/// A product whose stored set disagrees with its derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleProduct {
    pub product: ProductId,
    pub stored: SpecSet,
    pub derived: SpecSet,
}

/// A difference between an expected and an actual snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    MissingProduct { product: ProductId },
    UnexpectedProduct { product: ProductId },
    ProductDiffers {
        product: ProductId,
        expected: Product,
        actual: Product,
    },
    MissingVersion { version: VersionId },
    UnexpectedVersion { version: VersionId },
    VersionDiffers {
        version: VersionId,
        expected: Version,
        actual: Version,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProduct { product } => write!(f, "product {product} missing"),
            Self::UnexpectedProduct { product } => write!(f, "unexpected product {product}"),
            Self::ProductDiffers {
                product,
                expected,
                actual,
            } => write!(
                f,
                "product {product}: expected compatible {} with {} versions, found {} with {}",
                format_set(expected.compatible()),
                expected.versions().len(),
                format_set(actual.compatible()),
                actual.versions().len()
            ),
            Self::MissingVersion { version } => write!(f, "version {version} missing"),
            Self::UnexpectedVersion { version } => write!(f, "unexpected version {version}"),
            Self::VersionDiffers { version, .. } => write!(f, "version {version} differs"),
        }
    }
}

/// Result of an audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Number of products checked against their derivation.
    pub checked: usize,
    stale: Vec<StaleProduct>,
    discrepancies: Vec<Discrepancy>,
}

impl AuditReport {
    pub fn stale(&self) -> &[StaleProduct] {
        &self.stale
    }

    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.discrepancies
    }

    /// No stale product and no snapshot discrepancy.
    pub fn is_consistent(&self) -> bool {
        self.stale.is_empty() && self.discrepancies.is_empty()
    }
}

/// Full copy of a store's records, keyed for stable comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub products: BTreeMap<ProductId, Product>,
    pub versions: BTreeMap<VersionId, Version>,
}

impl StoreSnapshot {
    pub fn capture(store: &Store) -> Self {
        Self {
            products: store.products().map(|p| (p.id(), p.clone())).collect(),
            versions: store.versions().map(|v| (v.id(), v.clone())).collect(),
        }
    }

    /// Load a snapshot previously written with [`StoreSnapshot::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Check every product's stored set against a fresh derivation.
///
/// # Errors
///
/// Fails only when the store holds dangling references.
pub fn check_consistency(store: &Store) -> Result<AuditReport> {
    let mut report = AuditReport::default();
    for product in store.products() {
        let derived = derive_compatibility(store, product.id())?;
        report.checked += 1;
        if &derived != product.compatible() {
            tracing::warn!(
                product = %product.id(),
                stored = %format_set(product.compatible()),
                derived = %format_set(&derived),
                "Stale compatible set"
            );
            report.stale.push(StaleProduct {
                product: product.id(),
                stored: product.compatible().clone(),
                derived,
            });
        }
    }
    Ok(report)
}

/// List every difference between two snapshots.
pub fn compare_snapshot(expected: &StoreSnapshot, actual: &StoreSnapshot) -> Vec<Discrepancy> {
    let mut out = Vec::new();

    for (id, want) in &expected.products {
        match actual.products.get(id) {
            None => out.push(Discrepancy::MissingProduct { product: *id }),
            Some(got) if got != want => out.push(Discrepancy::ProductDiffers {
                product: *id,
                expected: want.clone(),
                actual: got.clone(),
            }),
            Some(_) => {}
        }
    }
    for id in actual.products.keys() {
        if !expected.products.contains_key(id) {
            out.push(Discrepancy::UnexpectedProduct { product: *id });
        }
    }

    for (id, want) in &expected.versions {
        match actual.versions.get(id) {
            None => out.push(Discrepancy::MissingVersion { version: *id }),
            Some(got) if got != want => out.push(Discrepancy::VersionDiffers {
                version: *id,
                expected: want.clone(),
                actual: got.clone(),
            }),
            Some(_) => {}
        }
    }
    for id in actual.versions.keys() {
        if !expected.versions.contains_key(id) {
            out.push(Discrepancy::UnexpectedVersion { version: *id });
        }
    }

    out
}

/// Run the consistency check and compare the store against `expected`.
pub fn verify(store: &Store, expected: &StoreSnapshot) -> Result<AuditReport> {
    let mut report = check_consistency(store)?;
    report.discrepancies = compare_snapshot(expected, &store.snapshot());
    Ok(report)
}
