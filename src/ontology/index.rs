//! Statement relation index: which relation triples each statement produced.
//!
//! Append-only map from statement identifier to the ordered list of
//! (subject, relation, object) triples created while processing that
//! statement. Populated by the relation registry as a byproduct of
//! [`super::relations::RelationRegistry::define_relationship`] and consumed
//! read-only by the rule synthesizer.

use dashmap::DashMap;

use crate::statement::StatementId;

use super::RelationTriple;

/// Append-only statement → relation-triple index.
#[derive(Debug, Default)]
pub struct StatementIndex {
    triples: DashMap<StatementId, Vec<RelationTriple>>,
}

impl StatementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a triple under `statement`, preserving creation order.
    pub fn record(&self, statement: &StatementId, triple: RelationTriple) {
        self.triples
            .entry(statement.clone())
            .or_default()
            .push(triple);
    }

    /// The triples recorded for `statement`, in creation order.
    ///
    /// Returns an empty list for statements that produced no relations.
    pub fn triples_for(&self, statement: &StatementId) -> Vec<RelationTriple> {
        self.triples
            .get(statement)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Number of statements with at least one recorded triple.
    pub fn statement_count(&self) -> usize {
        self.triples.len()
    }

    /// Total number of recorded triples.
    pub fn triple_count(&self) -> usize {
        self.triples.iter().map(|r| r.value().len()).sum()
    }
}
