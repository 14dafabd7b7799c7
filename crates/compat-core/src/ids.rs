//! Product and version identifiers, and the sources that mint them.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable unique identifier of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

/// Unique identifier of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            /// Wrap an existing UUID (useful for testing/recreation).
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(ProductId);
uuid_id!(VersionId);

/// A source of fresh identifiers.
///
/// The store owns one of these; the engine never cares how identifiers are
/// produced, only that they are unique within a store.
pub trait IdSource: fmt::Debug {
    /// Mint an identifier for a new product.
    fn fresh_product(&mut self) -> ProductId;

    /// Mint an identifier for a new version.
    fn fresh_version(&mut self) -> VersionId;
}

/// Random v4 UUIDs. The default source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn fresh_product(&mut self) -> ProductId {
        ProductId(Uuid::new_v4())
    }

    fn fresh_version(&mut self) -> VersionId {
        VersionId(Uuid::new_v4())
    }
}

/// Deterministic identifiers drawn from a single counter.
///
/// Products and versions share the counter, so no two identifiers minted
/// by one source have the same UUID.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u128,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialIds {
    /// Start counting from 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn bump(&mut self) -> Uuid {
        let id = Uuid::from_u128(self.next);
        self.next += 1;
        id
    }
}

impl IdSource for SequentialIds {
    fn fresh_product(&mut self) -> ProductId {
        ProductId(self.bump())
    }

    fn fresh_version(&mut self) -> VersionId {
        VersionId(self.bump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_distinct_and_ordered() {
        let mut ids = SequentialIds::new();
        let p = ids.fresh_product();
        let v = ids.fresh_version();
        let p2 = ids.fresh_product();

        assert_eq!(p.as_uuid(), Uuid::from_u128(1));
        assert_eq!(v.as_uuid(), Uuid::from_u128(2));
        assert!(p < p2);
    }

    #[test]
    fn test_random_ids_are_unique() {
        let mut ids = RandomIds;
        assert_ne!(ids.fresh_version(), ids.fresh_version());
    }

    #[test]
    fn test_display_matches_uuid() {
        let uuid = Uuid::from_u128(42);
        assert_eq!(ProductId::from_uuid(uuid).to_string(), uuid.to_string());
    }
}
