//! Exact-match multilingual name index.
//!
//! Maps lowercased place names in every indexed language to the entities
//! that carry them. Keys are ordered so serialized snapshots are stable.
//!
//! Keys are written in two forms: the lowercased, trimmed name and its
//! query form (see [`query_form`]), so that "St. Louis" is reachable both
//! as `st. louis` and as `st louis`.

use std::collections::BTreeMap;

use geoscrub_gazetteer_models::NameRef;
use serde::{Deserialize, Serialize};

/// Lowercases and trims a name to produce an index key.
#[must_use]
pub fn index_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The normal form queries are looked up in: lowercased, trimmed, with
/// periods and commas removed.
#[must_use]
pub fn query_form(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Name string to entity reference mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameIndex {
    keys: BTreeMap<String, Vec<NameRef>>,
}

impl NameIndex {
    /// Creates an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Adds a reference under `name`.
    ///
    /// Call [`Self::finalize`] once all references are added.
    pub fn insert(&mut self, name: &str, name_ref: &NameRef) {
        let key = index_key(name);
        if key.is_empty() {
            return;
        }
        let query_key = query_form(&key);
        if !query_key.is_empty() && query_key != key {
            self.keys
                .entry(query_key)
                .or_default()
                .push(name_ref.clone());
        }
        self.keys.entry(key).or_default().push(name_ref.clone());
    }

    /// Sorts and deduplicates every posting list so that building from the
    /// same input always yields the same index.
    pub fn finalize(&mut self) {
        for refs in self.keys.values_mut() {
            refs.sort();
            refs.dedup();
        }
    }

    /// All references stored under the lowercased `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> &[NameRef] {
        self.keys.get(&index_key(name)).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the index has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
