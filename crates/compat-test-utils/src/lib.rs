//! Shared test utilities for the compat-tracker workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`catalog`] — [`Catalog`] builder addressing products by alias
//! - [`files`] — scenario files on disk, bundled and temporary

pub mod catalog;
pub mod files;

pub use catalog::Catalog;
pub use files::{ScenarioDir, bundled_scenarios, scenarios_dir};
