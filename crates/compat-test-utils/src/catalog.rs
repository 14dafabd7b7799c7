//! [`Catalog`] builder for store-level tests.

use std::collections::BTreeMap;

use compat_core::{
    Admission, EngineConfig, ProductId, SequentialIds, SpecSet, Store, VersionId,
    check_consistency, spec_set,
};

/// A store with deterministic identifiers whose products are addressed by
/// alias.
///
/// # Example
///
/// ```rust
/// use compat_test_utils::Catalog;
///
/// let mut catalog = Catalog::new();
/// catalog.put("base", &["spec1"], &[]);
/// catalog.put("app", &["spec1"], &["base"]);
/// catalog.assert_compatible("app", &["spec1"]);
/// catalog.assert_consistent();
/// ```
#[derive(Debug)]
pub struct Catalog {
    store: Store,
    products: BTreeMap<String, ProductId>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: Store::with_id_source(SequentialIds::new()).with_config(config),
            products: BTreeMap::new(),
        }
    }

    /// Return the product for `alias`, creating it on first use.
    pub fn product(&mut self, alias: &str) -> ProductId {
        if let Some(id) = self.products.get(alias) {
            return *id;
        }
        let id = self.store.create_product();
        self.products.insert(alias.to_string(), id);
        id
    }

    /// Look up an alias that must already exist.
    pub fn id(&self, alias: &str) -> ProductId {
        *self
            .products
            .get(alias)
            .unwrap_or_else(|| panic!("Catalog: unknown product alias '{alias}'"))
    }

    /// Put a fresh version. Products named in `deps` are created if needed.
    pub fn put(&mut self, alias: &str, supports: &[&str], deps: &[&str]) -> Admission {
        self.put_at(alias, None, supports, deps)
    }

    /// Put a fresh version that must be accepted, returning its id.
    pub fn add(&mut self, alias: &str, supports: &[&str], deps: &[&str]) -> VersionId {
        self.put(alias, supports, deps)
            .version_id()
            .unwrap_or_else(|| panic!("Catalog: version for '{alias}' was rejected"))
    }

    /// Replace an existing version in place.
    pub fn update(
        &mut self,
        alias: &str,
        version: VersionId,
        supports: &[&str],
        deps: &[&str],
    ) -> Admission {
        self.put_at(alias, Some(version), supports, deps)
    }

    fn put_at(
        &mut self,
        alias: &str,
        version: Option<VersionId>,
        supports: &[&str],
        deps: &[&str],
    ) -> Admission {
        let product = self.product(alias);
        let dependencies: Vec<ProductId> = deps.iter().map(|d| self.product(d)).collect();
        self.store
            .put_version(
                product,
                version,
                spec_set(supports.iter().copied()),
                dependencies,
            )
            .expect("Catalog: put_version precondition violated")
    }

    pub fn compatible(&self, alias: &str) -> SpecSet {
        self.store
            .compatible(self.id(alias))
            .expect("Catalog: product vanished from store")
            .clone()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn assert_compatible(&self, alias: &str, expected: &[&str]) {
        assert_eq!(
            self.compatible(alias),
            spec_set(expected.iter().copied()),
            "compatible set of '{alias}'"
        );
    }

    /// Assert every product's stored set equals its derivation.
    pub fn assert_consistent(&self) {
        let report = check_consistency(&self.store).expect("Catalog: audit failed");
        assert!(
            report.is_consistent(),
            "stale products: {:?}",
            report.stale()
        );
    }
}
