//! Error types for compat-core
//!
//! An inadmissible version is not an error: it is reported as
//! [`Admission::Rejected`](crate::Admission::Rejected). The variants here
//! are precondition violations and failures of the surrounding layers
//! (configuration, scenario files, I/O).

use std::path::PathBuf;

use crate::ids::{ProductId, VersionId};
use crate::spec::SpecTag;

/// Result type for compat-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in compat-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A product identifier does not name a product in the store
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// A version identifier does not name a version in the store
    #[error("Unknown version: {0}")]
    UnknownVersion(VersionId),

    /// An existing version was addressed through a product that does not own it
    #[error("Version {version} belongs to product {owner}, not {requested}")]
    VersionOwnerMismatch {
        version: VersionId,
        owner: ProductId,
        requested: ProductId,
    },

    /// A version lists its own product as a dependency and the policy forbids it
    #[error("Version of product {product} may not depend on its own product")]
    SelfDependency { product: ProductId },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// A scenario referenced a spec tag missing from its vocabulary
    #[error("Unknown spec '{tag}' in scenario {context}")]
    UnknownSpec { tag: SpecTag, context: String },

    /// A scenario referenced a product alias it never declared
    #[error("Unknown product alias '{alias}' in scenario {context}")]
    UnknownAlias { alias: String, context: String },

    /// A scenario declared the same alias twice
    #[error("Duplicate alias '{alias}' in scenario")]
    DuplicateAlias { alias: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_owner_mismatch_names_both_products() {
        let owner = ProductId::from_uuid(Uuid::from_u128(1));
        let requested = ProductId::from_uuid(Uuid::from_u128(2));
        let version = VersionId::from_uuid(Uuid::from_u128(3));
        let error = Error::VersionOwnerMismatch {
            version,
            owner,
            requested,
        };

        let display = error.to_string();
        assert!(display.contains(&owner.to_string()));
        assert!(display.contains(&requested.to_string()));
    }
}
