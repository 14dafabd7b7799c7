//! Product and version records.

use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, VersionId};
use crate::spec::SpecSet;

/// A product whose compatibility is derived from its versions.
///
/// `compatible` is a cache: it is always reproducible from the product's
/// versions and the stored compatibility of their dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    compatible: SpecSet,
    versions: Vec<VersionId>,
}

impl Product {
    pub(crate) fn new(id: ProductId) -> Self {
        Self {
            id,
            compatible: SpecSet::new(),
            versions: Vec::new(),
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    /// The last committed compatible set.
    pub fn compatible(&self) -> &SpecSet {
        &self.compatible
    }

    /// Versions owned by this product, in insertion order.
    pub fn versions(&self) -> &[VersionId] {
        &self.versions
    }

    /// Replace the cached set, returning the previous one.
    pub(crate) fn set_compatible(&mut self, set: SpecSet) -> SpecSet {
        std::mem::replace(&mut self.compatible, set)
    }

    pub(crate) fn push_version(&mut self, version: VersionId) {
        self.versions.push(version);
    }
}

/// A version record under exactly one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    id: VersionId,
    product: ProductId,
    supports: SpecSet,
    dependencies: Vec<ProductId>,
}

impl Version {
    pub(crate) fn new(
        id: VersionId,
        product: ProductId,
        supports: SpecSet,
        dependencies: Vec<ProductId>,
    ) -> Self {
        Self {
            id,
            product,
            supports,
            dependencies,
        }
    }

    pub fn id(&self) -> VersionId {
        self.id
    }

    /// The owning product. Never changes after creation.
    pub fn product(&self) -> ProductId {
        self.product
    }

    /// Specs this version declares it wants to support.
    pub fn supports(&self) -> &SpecSet {
        &self.supports
    }

    /// Products this version depends on, exactly as given.
    pub fn dependencies(&self) -> &[ProductId] {
        &self.dependencies
    }

    pub fn depends_on(&self, product: ProductId) -> bool {
        self.dependencies.contains(&product)
    }
}
