//! Per-request evaluation context.
//!
//! A `Context` carries the string facts one decision is made from: the
//! caller's role mask and action id, any domain overrides (epoch, severity,
//! signature flags), and, as evaluation proceeds, each clause's own boolean
//! result written back under the clause's name. Lifetime is one request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ordered::OrderedMap;

/// Mutable string-to-string fact map for a single policy evaluation.
///
/// The engine appends clause results (`"1"`/`"0"`) under each clause name as
/// it goes, so later clauses and the combination expression can reference
/// earlier outcomes. Entries are kept in insertion order; the audit ledger
/// takes a sorted snapshot via [`Context::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context(OrderedMap<String>);

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fact, overwriting in place if the key already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    /// Look up a fact.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True if the fact is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &String)> {
        self.0.iter()
    }

    /// An immutable, key-sorted copy for canonical audit serialization.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.set(k, v);
        }
        ctx
    }
}
