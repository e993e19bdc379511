//! Backend status normalization
//!
//! Backends add status values over time without notice, so normalization is
//! total: anything not in a backend's table maps to that table's fallback.

use crate::state::CanonicalState;
use std::collections::HashMap;

/// Fallback used when a backend has no table or does not set one explicitly
pub const DEFAULT_FALLBACK: CanonicalState = CanonicalState::Pending;

/// Status vocabulary of a single backend
///
/// Keys are matched after trimming and case folding, so `"powered_on"` and
/// `"POWERED_ON "` hit the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTable {
    entries: HashMap<String, CanonicalState>,
    fallback: CanonicalState,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: DEFAULT_FALLBACK,
        }
    }
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(raw, canonical)` pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, CanonicalState)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::new(), |table, (raw, state)| table.map(raw, state))
    }

    pub fn map(mut self, raw: &str, state: CanonicalState) -> Self {
        self.entries.insert(fold(raw), state);
        self
    }

    /// Map several raw aliases to one canonical state
    pub fn alias(mut self, raws: &[&str], state: CanonicalState) -> Self {
        for raw in raws {
            self.entries.insert(fold(raw), state);
        }
        self
    }

    pub fn with_fallback(mut self, fallback: CanonicalState) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> CanonicalState {
        self.fallback
    }

    /// Explicit entry for `raw`, without applying the fallback
    pub fn lookup(&self, raw: &str) -> Option<CanonicalState> {
        self.entries.get(&fold(raw)).copied()
    }

    pub fn resolve(&self, raw: &str) -> CanonicalState {
        self.lookup(raw).unwrap_or(self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by raw token
    pub fn entries(&self) -> Vec<(&str, CanonicalState)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(raw, state)| (raw.as_str(), *state))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

fn fold(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Maps `(backend, raw status)` to a canonical state
#[derive(Debug, Clone, Default)]
pub struct StateNormalizer {
    tables: HashMap<String, StatusTable>,
}

impl StateNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the vocabulary of a backend
    pub fn register(&mut self, backend: impl Into<String>, table: StatusTable) {
        let backend = backend.into();
        tracing::debug!(
            "Registered status table for {} ({} entries)",
            backend,
            table.len()
        );
        self.tables.insert(backend, table);
    }

    pub fn table(&self, backend: &str) -> Option<&StatusTable> {
        self.tables.get(backend)
    }

    pub fn normalize(&self, backend: &str, raw_status: &str) -> CanonicalState {
        match self.tables.get(backend) {
            Some(table) => table.resolve(raw_status),
            None => DEFAULT_FALLBACK,
        }
    }
}
