//! Ontology core: identifiers and records for concepts and relations.
//!
//! Concepts form a single-parent class hierarchy; relations are named,
//! directed, typed edges between concepts carrying per-statement provenance.
//! The two are distinct record types linked by identifier — there is no
//! shared dynamic base.
//!
//! - [`concepts::ConceptRegistry`]: canonical-name keyed concept store
//! - [`relations::RelationRegistry`]: relation store with collision resolution
//! - [`index::StatementIndex`]: statement → relation-triple provenance index

pub mod concepts;
pub mod index;
pub mod relations;

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::statement::StatementId;

/// Unique, niche-optimized identifier for a concept.
///
/// Uses `NonZeroU64` so that `Option<ConceptId>` is the same size as
/// `ConceptId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ConceptId(NonZeroU64);

impl ConceptId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ConceptId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "con:{}", self.0)
    }
}

/// Unique identifier for a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RelationId(NonZeroU64);

impl RelationId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(RelationId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for RelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rel:{}", self.0)
    }
}

/// Monotonic ID allocator shared by both registries.
///
/// Produces IDs starting from 1; 0 stays free as the niche value.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next raw ID, `None` once the space is exhausted.
    pub fn next_raw(&self) -> Option<NonZeroU64> {
        NonZeroU64::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A named class in the domain hierarchy (e.g. `Employer`).
///
/// Identity is the canonical name; at most one concept exists per name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    /// Canonical (collision-free) name.
    pub name: String,
    /// Parent in the class hierarchy; `None` for root concepts.
    pub superclass: Option<ConceptId>,
    /// Statements that caused or reused this concept, in processing order.
    pub statements: Vec<StatementId>,
}

/// Reuse policy applied when a relation label is defined more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniquenessPolicy {
    /// One physical relation per (label, domain concept) pair; colliding
    /// labels with a different domain get a uniquification suffix.
    #[default]
    Unique,
    /// All callers share one physical relation per label, regardless of
    /// domain.
    Shared,
}

/// A named, directed, typed edge between two concepts.
///
/// Identity is the resolved name, which may carry `'` uniquification
/// suffixes appended by the collision search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    /// Resolved relation name.
    pub name: String,
    pub domain: ConceptId,
    pub range: ConceptId,
    /// Existential (`some`) constraint flag.
    pub existential: bool,
    /// Audit trail: one comment per statement that created or reused this
    /// relation, in processing order.
    pub comments: Vec<String>,
    /// Policy the relation was created under.
    pub policy: UniquenessPolicy,
}

/// One (subject, relation, object) triple recorded while processing a
/// statement. The relation is carried by resolved name so rule atoms can be
/// emitted without another registry lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationTriple {
    pub subject: ConceptId,
    pub relation: String,
    pub object: ConceptId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_id_niche_optimization() {
        assert_eq!(
            std::mem::size_of::<Option<ConceptId>>(),
            std::mem::size_of::<ConceptId>()
        );
    }

    #[test]
    fn id_zero_is_none() {
        assert!(ConceptId::new(0).is_none());
        assert!(RelationId::new(0).is_none());
        assert_eq!(ConceptId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn allocator_produces_sequential_ids() {
        let alloc = IdAllocator::new();
        assert_eq!(alloc.next_raw().unwrap().get(), 1);
        assert_eq!(alloc.next_raw().unwrap().get(), 2);
        assert_eq!(alloc.next_raw().unwrap().get(), 3);
    }

    #[test]
    fn id_display_prefixes() {
        assert_eq!(ConceptId::new(3).unwrap().to_string(), "con:3");
        assert_eq!(RelationId::new(3).unwrap().to_string(), "rel:3");
    }

    #[test]
    fn uniqueness_policy_default_is_unique() {
        assert_eq!(UniquenessPolicy::default(), UniquenessPolicy::Unique);
    }
}
