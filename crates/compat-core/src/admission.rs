//! The admission gate for new and updated versions.
//!
//! A version may only declare specs that every one of its dependencies
//! currently supports. Anything beyond that is refused with an explicit
//! [`Admission::Rejected`] outcome and the store is left untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit;
use crate::config::SelfDependencyPolicy;
use crate::engine::{allowed_specs, derive_compatibility};
use crate::error::{Error, Result};
use crate::ids::{ProductId, VersionId};
use crate::model::Version;
use crate::propagation::{CascadeReport, commit_compatibility};
use crate::spec::{SpecSet, format_set};
use crate::store::Store;

/// Why a version was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// The product the version was proposed for.
    pub product: ProductId,
    /// Declared specs that the dependencies do not all support.
    pub disallowed: SpecSet,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version for product {} declares unsupported specs {}",
            self.product,
            format_set(&self.disallowed)
        )
    }
}

/// A version that passed the gate and was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedVersion {
    pub version: VersionId,
    /// `true` when the identifier was appended to the product's versions.
    pub created: bool,
    /// Writes performed by the resulting commit.
    pub cascade: CascadeReport,
}

/// Outcome of [`put_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Admission {
    Accepted(AcceptedVersion),
    Rejected(Rejection),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The version identifier used, if accepted.
    pub fn version_id(&self) -> Option<VersionId> {
        match self {
            Self::Accepted(accepted) => Some(accepted.version),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_accepted(self) -> Option<AcceptedVersion> {
        match self {
            Self::Accepted(accepted) => Some(accepted),
            Self::Rejected(_) => None,
        }
    }
}

/// Create or update a version of `product`.
///
/// With `version = None` a fresh identifier is minted and appended to the
/// product's versions. With `Some(id)` naming an existing version, that
/// record's supports and dependencies are replaced in place; an unknown
/// `id` is reserved as a fresh identifier.
///
/// Before anything is written, `supports` is checked against the
/// intersection of the stored compatible sets of `dependencies`. Declared
/// specs outside that intersection reject the version. On acceptance the
/// product's compatibility is re-derived and committed, cascading to its
/// dependents.
///
/// # Errors
///
/// Precondition violations leave the store untouched:
/// - `Error::UnknownProduct` if `product` or a dependency is missing
/// - `Error::VersionOwnerMismatch` if `version` belongs to another product
/// - `Error::SelfDependency` if `dependencies` contains `product` and the
///   store's policy rejects self-dependencies
pub fn put_version(
    store: &mut Store,
    product: ProductId,
    version: Option<VersionId>,
    supports: SpecSet,
    dependencies: Vec<ProductId>,
) -> Result<Admission> {
    store.require_product(product)?;
    for dependency in &dependencies {
        store.require_product(*dependency)?;
    }

    if dependencies.contains(&product)
        && store.config().self_dependency == SelfDependencyPolicy::Reject
    {
        return Err(Error::SelfDependency { product });
    }

    let existing_owner = version.and_then(|id| store.version(id)).map(Version::product);
    if let (Some(id), Some(owner)) = (version, existing_owner)
        && owner != product
    {
        return Err(Error::VersionOwnerMismatch {
            version: id,
            owner,
            requested: product,
        });
    }

    let allowed = allowed_specs(store, &supports, &dependencies)?;
    let disallowed: SpecSet = supports.difference(&allowed).cloned().collect();
    if !disallowed.is_empty() {
        tracing::info!(
            product = %product,
            disallowed = %format_set(&disallowed),
            "Rejected inadmissible version"
        );
        return Ok(Admission::Rejected(Rejection {
            product,
            disallowed,
        }));
    }

    let (id, created) = match version {
        Some(id) => (id, existing_owner.is_none()),
        None => (store.fresh_version_id(), true),
    };
    if created {
        store.product_mut(product)?.push_version(id);
    }
    tracing::debug!(
        product = %product,
        version = %id,
        created,
        supports = %format_set(&supports),
        "Admitted version"
    );
    store.insert_version(Version::new(id, product, supports, dependencies));

    let derived = derive_compatibility(store, product)?;
    let cascade = commit_compatibility(store, product, derived)?;

    if store.config().audit_after_commit {
        let report = audit::check_consistency(store)?;
        if !report.is_consistent() {
            tracing::warn!(
                stale = report.stale().len(),
                "Store left inconsistent after commit (dependency cycle?)"
            );
        }
    }

    Ok(Admission::Accepted(AcceptedVersion {
        version: id,
        created,
        cascade,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::spec::spec_set;
    use uuid::Uuid;

    fn store_with_base(base_specs: &[&str]) -> (Store, ProductId) {
        let mut store = Store::new();
        let base = store.create_product();
        store
            .put_version(base, None, spec_set(base_specs.iter().copied()), vec![])
            .unwrap();
        (store, base)
    }

    #[test]
    fn test_fresh_version_is_appended() {
        let mut store = Store::new();
        let p = store.create_product();

        let admission = store.put_version(p, None, spec_set(["spec1"]), vec![]).unwrap();
        let id = admission.version_id().unwrap();

        assert_eq!(store.product(p).unwrap().versions(), &[id]);
        assert_eq!(store.version(id).unwrap().product(), p);
    }

    #[test]
    fn test_rejection_lists_disallowed_specs() {
        let (mut store, base) = store_with_base(&["spec1"]);
        let p = store.create_product();

        let admission = store
            .put_version(p, None, spec_set(["spec1", "spec2"]), vec![base])
            .unwrap();

        let rejection = admission.rejection().unwrap();
        assert_eq!(rejection.product, p);
        assert_eq!(rejection.disallowed, spec_set(["spec2"]));
        assert!(rejection.to_string().contains("{spec2}"));
    }

    #[test]
    fn test_update_in_place_does_not_append() {
        let mut store = Store::new();
        let p = store.create_product();
        let id = store
            .put_version(p, None, spec_set(["spec1"]), vec![])
            .unwrap()
            .version_id()
            .unwrap();

        let accepted = store
            .put_version(p, Some(id), spec_set(["spec2"]), vec![])
            .unwrap()
            .into_accepted()
            .unwrap();

        assert!(!accepted.created);
        assert_eq!(store.product(p).unwrap().versions().len(), 1);
        assert_eq!(store.version(id).unwrap().supports(), &spec_set(["spec2"]));
        assert_eq!(store.compatible(p).unwrap(), &spec_set(["spec2"]));
    }

    #[test]
    fn test_unknown_supplied_id_is_reserved() {
        let mut store = Store::new();
        let p = store.create_product();
        let id = VersionId::from_uuid(Uuid::from_u128(1234));

        let accepted = store
            .put_version(p, Some(id), spec_set(["spec1"]), vec![])
            .unwrap()
            .into_accepted()
            .unwrap();

        assert!(accepted.created);
        assert_eq!(accepted.version, id);
        assert_eq!(store.product(p).unwrap().versions(), &[id]);
    }

    #[test]
    fn test_owner_mismatch_is_refused() {
        let mut store = Store::new();
        let a = store.create_product();
        let b = store.create_product();
        let id = store
            .put_version(a, None, spec_set(["spec1"]), vec![])
            .unwrap()
            .version_id()
            .unwrap();

        let err = store
            .put_version(b, Some(id), spec_set(["spec1"]), vec![])
            .unwrap_err();

        assert!(matches!(err, Error::VersionOwnerMismatch { owner, .. } if owner == a));
        assert!(store.product(b).unwrap().versions().is_empty());
    }

    #[test]
    fn test_unknown_dependency_is_refused() {
        let mut store = Store::new();
        let p = store.create_product();
        let missing = ProductId::from_uuid(Uuid::from_u128(5));

        let err = store
            .put_version(p, None, spec_set(["spec1"]), vec![missing])
            .unwrap_err();

        assert!(matches!(err, Error::UnknownProduct(id) if id == missing));
        assert_eq!(store.version_count(), 0);
    }

    #[test]
    fn test_self_dependency_rejected_by_default() {
        let mut store = Store::new();
        let p = store.create_product();

        let err = store
            .put_version(p, None, spec_set(["spec1"]), vec![p])
            .unwrap_err();

        assert!(matches!(err, Error::SelfDependency { product } if product == p));
    }

    #[test]
    fn test_self_dependency_allowed_reads_own_set() {
        let config = EngineConfig {
            self_dependency: SelfDependencyPolicy::Allow,
            ..EngineConfig::default()
        };
        let mut store = Store::new().with_config(config);
        let p = store.create_product();

        // Nothing is compatible yet, so a self-dependent version can declare nothing.
        let admission = store.put_version(p, None, spec_set(["spec1"]), vec![p]).unwrap();
        assert!(!admission.is_accepted());

        store.put_version(p, None, spec_set(["spec1"]), vec![]).unwrap();
        let admission = store.put_version(p, None, spec_set(["spec1"]), vec![p]).unwrap();
        assert!(admission.is_accepted());
    }

    #[test]
    fn test_duplicate_dependencies_are_stored_as_given() {
        let (mut store, base) = store_with_base(&["spec1"]);
        let p = store.create_product();

        let id = store
            .put_version(p, None, spec_set(["spec1"]), vec![base, base])
            .unwrap()
            .version_id()
            .unwrap();

        assert_eq!(store.version(id).unwrap().dependencies(), &[base, base]);
        assert_eq!(store.compatible(p).unwrap(), &spec_set(["spec1"]));
    }

    #[test]
    fn test_admission_serializes_with_outcome_tag() {
        let (mut store, base) = store_with_base(&["spec1"]);
        let p = store.create_product();
        let admission = store
            .put_version(p, None, spec_set(["spec2"]), vec![base])
            .unwrap();

        let json = serde_json::to_value(&admission).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["disallowed"][0], "spec2");
    }
}
