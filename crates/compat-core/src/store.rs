//! In-memory product/version store.
//!
//! The store is an explicit value: every operation takes it by reference,
//! so independent stores can coexist (one per scenario, one per test).
//! Mutating operations take `&mut Store`, which serialises writers.

use std::collections::BTreeMap;

use crate::admission::{self, Admission};
use crate::audit::StoreSnapshot;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::ids::{IdSource, ProductId, RandomIds, VersionId};
use crate::model::{Product, Version};
use crate::spec::SpecSet;

/// Holds every product and version record.
#[derive(Debug)]
pub struct Store {
    products: BTreeMap<ProductId, Product>,
    versions: BTreeMap<VersionId, Version>,
    ids: Box<dyn IdSource>,
    config: EngineConfig,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store minting random identifiers.
    pub fn new() -> Self {
        Self::with_id_source(RandomIds)
    }

    /// Create an empty store with a specific identifier source.
    pub fn with_id_source(ids: impl IdSource + 'static) -> Self {
        Self {
            products: BTreeMap::new(),
            versions: BTreeMap::new(),
            ids: Box::new(ids),
            config: EngineConfig::default(),
        }
    }

    /// Replace the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Reads ---

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn version(&self, id: VersionId) -> Option<&Version> {
        self.versions.get(&id)
    }

    /// Iterate over all products.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Iterate over all versions.
    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.versions.values()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn contains_product(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }

    /// Look up a product, treating absence as a precondition violation.
    pub fn require_product(&self, id: ProductId) -> Result<&Product> {
        self.products.get(&id).ok_or(Error::UnknownProduct(id))
    }

    /// Look up a version, treating absence as a precondition violation.
    pub fn require_version(&self, id: VersionId) -> Result<&Version> {
        self.versions.get(&id).ok_or(Error::UnknownVersion(id))
    }

    /// The stored compatible set of a product.
    pub fn compatible(&self, id: ProductId) -> Result<&SpecSet> {
        self.require_product(id).map(Product::compatible)
    }

    // --- Writes ---

    /// Create an empty product and return its identifier.
    pub fn create_product(&mut self) -> ProductId {
        let id = self.ids.fresh_product();
        self.products.insert(id, Product::new(id));
        tracing::debug!(product = %id, "Created product");
        id
    }

    /// Create or update a version through the admission gate.
    ///
    /// See [`admission::put_version`].
    pub fn put_version(
        &mut self,
        product: ProductId,
        version: Option<VersionId>,
        supports: SpecSet,
        dependencies: Vec<ProductId>,
    ) -> Result<Admission> {
        admission::put_version(self, product, version, supports, dependencies)
    }

    /// Capture the full store state for comparison.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::capture(self)
    }

    pub(crate) fn fresh_version_id(&mut self) -> VersionId {
        self.ids.fresh_version()
    }

    pub(crate) fn product_mut(&mut self, id: ProductId) -> Result<&mut Product> {
        self.products.get_mut(&id).ok_or(Error::UnknownProduct(id))
    }

    /// Write a version record, replacing any record with the same id.
    pub(crate) fn insert_version(&mut self, version: Version) {
        self.versions.insert(version.id(), version);
    }
}
