//! Spec tags and the spec vocabulary.
//!
//! A spec is an opaque capability tag. The engine only compares tags with
//! set operations; it never inspects or validates them. The
//! [`SpecRegistry`] is the closed vocabulary a caller (such as a scenario
//! file) declares up front so that typos surface as errors instead of as
//! silently empty intersections.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque capability tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecTag(String);

impl SpecTag {
    /// Create a tag from any string-like value.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpecTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for SpecTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// An unordered set of spec tags.
///
/// Backed by a `BTreeSet` so iteration and serialized output are stable.
pub type SpecSet = BTreeSet<SpecTag>;

/// Build a [`SpecSet`] from string slices.
pub fn spec_set<I, S>(tags: I) -> SpecSet
where
    I: IntoIterator<Item = S>,
    S: Into<SpecTag>,
{
    tags.into_iter().map(Into::into).collect()
}

/// Render a set as `{a, b, c}` for log lines and reports.
pub fn format_set(set: &SpecSet) -> String {
    let inner: Vec<&str> = set.iter().map(SpecTag::as_str).collect();
    format!("{{{}}}", inner.join(", "))
}

/// The closed vocabulary of spec tags known to a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecRegistry {
    tags: BTreeSet<SpecTag>,
}

impl SpecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a tag is part of the vocabulary.
    pub fn contains(&self, tag: &SpecTag) -> bool {
        self.tags.contains(tag)
    }

    /// Return the tags of `set` that are not part of the vocabulary.
    pub fn unknown_in<'a>(&self, set: &'a SpecSet) -> Vec<&'a SpecTag> {
        set.iter().filter(|tag| !self.contains(tag)).collect()
    }

    /// All known tags, sorted.
    pub fn known(&self) -> impl Iterator<Item = &SpecTag> {
        self.tags.iter()
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<S: Into<SpecTag>> FromIterator<S> for SpecRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
