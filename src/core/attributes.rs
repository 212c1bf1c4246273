//! Attribute sets describing variants and requested artifact forms.
//!
//! An [`AttributeContainer`] is an ordered set of `key = value` string pairs. Artifacts
//! carry the attributes of the form they are produced in; consumers request a form by
//! attributes, and a transform bridges the two when they differ.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered, value-comparable set of attributes.
///
/// Keys are kept sorted so two containers with the same entries are equal, hash the
/// same and display identically, which makes them usable as part of memoization keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeContainer {
    entries: BTreeMap<String, String>,
}

impl AttributeContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether the container has no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether a candidate carrying these attributes satisfies `requested`.
    ///
    /// Every requested attribute must either be absent from the candidate or carry the
    /// same value. An empty request is satisfied by every candidate.
    pub fn is_compatible_with(&self, requested: &AttributeContainer) -> bool {
        requested.entries.iter().all(|(key, value)| match self.entries.get(key) {
            Some(own) => own == value,
            None => true,
        })
    }

    /// A copy of `self` with every entry of `overrides` applied on top.
    #[must_use]
    pub fn merged(&self, overrides: &AttributeContainer) -> AttributeContainer {
        let mut merged = self.clone();
        for (key, value) in &overrides.entries {
            merged.entries.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl fmt::Display for AttributeContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeContainer {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
