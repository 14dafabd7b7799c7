//! Compatibility tracking for products and their versions.
//!
//! Each product carries a *compatible set*: the spec tags it currently
//! supports. The set is derived bottom-up from the product's versions,
//! each version contributing the specs it declares, capped by what every
//! product it depends on currently supports.
//!
//! - **Engine**: derives a product's set from its versions ([`engine`])
//! - **Propagation**: commits a set and cascades to dependents ([`propagation`])
//! - **Admission**: refuses versions that declare more than their dependencies allow ([`admission`])
//! - **Audit**: checks stored sets against derivation and snapshots ([`audit`])
//! - **Scenarios**: declarative TOML replays with expectations ([`scenario`])
//!
//! # Example
//!
//! ```
//! use compat_core::{Store, spec_set};
//!
//! let mut store = Store::new();
//! let base = store.create_product();
//! let app = store.create_product();
//!
//! store.put_version(base, None, spec_set(["spec1"]), vec![]).unwrap();
//!
//! let admission = store
//!     .put_version(app, None, spec_set(["spec1", "spec2"]), vec![base])
//!     .unwrap();
//! assert!(!admission.is_accepted());
//! assert!(store.compatible(app).unwrap().is_empty());
//! ```

pub mod admission;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod model;
pub mod propagation;
pub mod scenario;
pub mod spec;
pub mod store;

pub use admission::{AcceptedVersion, Admission, Rejection, put_version};
pub use audit::{AuditReport, Discrepancy, StaleProduct, StoreSnapshot, check_consistency};
pub use config::{ConfigResolver, EngineConfig, EngineOverrides, SelfDependencyPolicy};
pub use engine::{allowed_specs, derive_compatibility};
pub use error::{Error, Result};
pub use ids::{IdSource, ProductId, RandomIds, SequentialIds, VersionId};
pub use model::{Product, Version};
pub use propagation::{CascadeReport, CommitRecord, commit_compatibility};
pub use scenario::{Scenario, ScenarioReport, ScenarioRunner};
pub use spec::{SpecRegistry, SpecSet, SpecTag, format_set, spec_set};
pub use store::Store;
