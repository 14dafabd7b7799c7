//! Compatibility derivation.
//!
//! Derivation is one layer deep: a version's contribution reads the
//! *stored* compatible set of each dependency and never recomputes it.
//! Keeping dependencies current is the job of the cascade in
//! [`propagation`](crate::propagation).

use crate::error::Result;
use crate::ids::ProductId;
use crate::model::Version;
use crate::spec::SpecSet;
use crate::store::Store;

/// Intersect `supports` with the stored compatible set of every dependency.
///
/// `supports` is the fold seed, so an empty dependency list yields
/// `supports` unchanged.
///
/// # Errors
///
/// Returns `Error::UnknownProduct` if a dependency is not in the store.
pub fn allowed_specs(
    store: &Store,
    supports: &SpecSet,
    dependencies: &[ProductId],
) -> Result<SpecSet> {
    let mut allowed = supports.clone();
    for dependency in dependencies {
        let compatible = store.compatible(*dependency)?;
        allowed.retain(|tag| compatible.contains(tag));
    }
    Ok(allowed)
}

/// The specs a single version contributes to its product.
pub fn version_contribution(store: &Store, version: &Version) -> Result<SpecSet> {
    allowed_specs(store, version.supports(), version.dependencies())
}

/// Derive a product's compatible set from its versions.
///
/// The result is the union of every version's contribution; a product
/// without versions derives the empty set. Never mutates the store.
///
/// # Errors
///
/// Returns `Error::UnknownProduct` or `Error::UnknownVersion` when the
/// product, one of its versions, or one of their dependencies is missing.
pub fn derive_compatibility(store: &Store, product: ProductId) -> Result<SpecSet> {
    let record = store.require_product(product)?;
    let mut derived = SpecSet::new();
    for version_id in record.versions() {
        let version = store.require_version(*version_id)?;
        derived.extend(version_contribution(store, version)?);
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::spec::spec_set;
    use uuid::Uuid;

    #[test]
    fn test_product_without_versions_derives_empty() {
        let mut store = Store::new();
        let p = store.create_product();

        assert!(derive_compatibility(&store, p).unwrap().is_empty());
    }

    #[test]
    fn test_allowed_specs_without_dependencies_is_supports() {
        let store = Store::new();
        let supports = spec_set(["spec1", "spec2"]);

        assert_eq!(allowed_specs(&store, &supports, &[]).unwrap(), supports);
    }

    #[test]
    fn test_allowed_specs_intersects_every_dependency() {
        let mut store = Store::new();
        let a = store.create_product();
        let b = store.create_product();
        store
            .put_version(a, None, spec_set(["spec1", "spec2"]), vec![])
            .unwrap();
        store
            .put_version(b, None, spec_set(["spec2", "spec3"]), vec![])
            .unwrap();

        let allowed =
            allowed_specs(&store, &spec_set(["spec1", "spec2", "spec3"]), &[a, b]).unwrap();
        assert_eq!(allowed, spec_set(["spec2"]));
    }

    #[test]
    fn test_derive_unions_version_contributions() {
        let mut store = Store::new();
        let p = store.create_product();
        store.put_version(p, None, spec_set(["spec1"]), vec![]).unwrap();
        store.put_version(p, None, spec_set(["spec2"]), vec![]).unwrap();

        assert_eq!(
            derive_compatibility(&store, p).unwrap(),
            spec_set(["spec1", "spec2"])
        );
    }

    #[test]
    fn test_derive_unknown_product_fails_fast() {
        let store = Store::new();
        let missing = ProductId::from_uuid(Uuid::from_u128(99));

        let err = derive_compatibility(&store, missing).unwrap_err();
        assert!(matches!(err, Error::UnknownProduct(_)));
    }
}
