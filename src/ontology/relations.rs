//! Relation registry: named concept-to-concept edges with collision resolution.
//!
//! Relation labels derived from natural language collide: two statements can
//! both say `must_provide` about different domains. Under the
//! [`UniquenessPolicy::Unique`] policy each distinct (label, domain) pair
//! gets its own physical relation, uniquified with `'` suffixes; the choice
//! is remembered in a canonical-name mapping so identical calls resolve to
//! the same name for the rest of the run. Under
//! [`UniquenessPolicy::Shared`], all callers share the one relation with
//! that label.

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{LexiResult, RelationError};
use crate::names;
use crate::statement::StatementId;

use super::index::StatementIndex;
use super::{ConceptId, IdAllocator, Relation, RelationId, RelationTriple, UniquenessPolicy};

/// Default bound on the `'`-suffix collision search.
pub const DEFAULT_COLLISION_CAP: usize = 64;

/// Relation store keyed by resolved name.
pub struct RelationRegistry {
    by_name: DashMap<String, RelationId>,
    by_id: DashMap<RelationId, Relation>,
    /// (canonical label, domain concept) → resolved name. Populated the
    /// first time a unique relation is created for that pair; never cleared
    /// during a run.
    canonical: DashMap<(String, ConceptId), String>,
    alloc: IdAllocator,
    collision_cap: usize,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::with_collision_cap(DEFAULT_COLLISION_CAP)
    }

    pub fn with_collision_cap(collision_cap: usize) -> Self {
        Self {
            by_name: DashMap::new(),
            by_id: DashMap::new(),
            canonical: DashMap::new(),
            alloc: IdAllocator::new(),
            collision_cap,
        }
    }

    /// Define (or reuse) a relation from `subject` to `object`.
    ///
    /// The raw label is canonicalized, the resolved name is chosen per
    /// `policy`, a provenance comment is appended when `statement` is given,
    /// and the resulting triple is recorded in `index` under that statement.
    ///
    /// Returns `Ok(None)` when the label canonicalizes to nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn define_relationship(
        &self,
        subject: ConceptId,
        raw_label: &str,
        object: ConceptId,
        statement: Option<&StatementId>,
        constraint: &str,
        policy: UniquenessPolicy,
        index: &StatementIndex,
    ) -> LexiResult<Option<RelationId>> {
        let label = names::relation_label(raw_label);
        if label.is_empty() {
            warn!(statement = ?statement.map(StatementId::as_str), "empty relation label, skipping");
            return Ok(None);
        }

        let existing = match policy {
            UniquenessPolicy::Unique => self.resolve_unique(&label, subject)?,
            UniquenessPolicy::Shared => {
                let found = self.by_name.get(&label).map(|r| *r.value());
                (label.clone(), found)
            }
        };
        let (name, reuse) = existing;

        let id = match reuse {
            Some(id) => {
                debug!(name, "relation exists, updating");
                if let Some(mut relation) = self.by_id.get_mut(&id) {
                    if constraint == "some" {
                        relation.existential = true;
                    }
                    if let Some(stmt) = statement {
                        relation.comments.push(format!("From statement: {stmt}"));
                    }
                }
                id
            }
            None => {
                debug!(subject = %subject, name, object = %object, "defining relation");
                let id = self
                    .alloc
                    .next_raw()
                    .map(RelationId)
                    .ok_or(RelationError::AllocatorExhausted)?;
                let comments = statement
                    .map(|stmt| vec![format!("From statement: {stmt}")])
                    .unwrap_or_default();
                self.by_name.insert(name.clone(), id);
                self.by_id.insert(
                    id,
                    Relation {
                        id,
                        name: name.clone(),
                        domain: subject,
                        range: object,
                        existential: constraint == "some",
                        comments,
                        policy,
                    },
                );
                id
            }
        };

        if let Some(stmt) = statement {
            index.record(
                stmt,
                RelationTriple {
                    subject,
                    relation: name,
                    object,
                },
            );
        }

        Ok(Some(id))
    }

    /// Resolve the physical name for a unique (label, domain) pair.
    ///
    /// Consults the canonical mapping first; otherwise runs the bounded
    /// suffix search over the name-existence predicate. Returns the resolved
    /// name and the relation to reuse, if one already exists.
    fn resolve_unique(
        &self,
        label: &str,
        subject: ConceptId,
    ) -> LexiResult<(String, Option<RelationId>)> {
        let key = (label.to_string(), subject);
        if let Some(resolved) = self.canonical.get(&key) {
            let name = resolved.value().clone();
            let id = self.by_name.get(&name).map(|r| *r.value());
            return Ok((name, id));
        }

        let mut name = label.to_string();
        let mut attempts = 0;
        let reuse = loop {
            match self.by_name.get(&name).map(|r| *r.value()) {
                None => break None,
                Some(id) => {
                    let domain = self.by_id.get(&id).map(|r| r.domain);
                    if domain == Some(subject) {
                        break Some(id);
                    }
                    attempts += 1;
                    if attempts > self.collision_cap {
                        return Err(RelationError::CollisionCapExceeded {
                            label: label.to_string(),
                            attempts,
                        }
                        .into());
                    }
                    name.push('\'');
                    debug!(name, "relation name taken, appending marker");
                }
            }
        };

        self.canonical.insert(key, name.clone());
        Ok((name, reuse))
    }

    /// Resolved name for (original label, subject), falling back to the
    /// label unchanged (shared-policy relations are never remapped).
    pub fn resolved_name(&self, original_label: &str, subject: ConceptId) -> String {
        let label = names::relation_label(original_label);
        self.canonical
            .get(&(label, subject))
            .map(|r| r.value().clone())
            .unwrap_or_else(|| original_label.to_string())
    }

    /// Fetch a relation record by ID.
    pub fn relation(&self, id: RelationId) -> Option<Relation> {
        self.by_id.get(&id).map(|r| r.value().clone())
    }

    /// Look up a relation by its resolved name.
    pub fn get_by_name(&self, name: &str) -> Option<RelationId> {
        self.by_name.get(name).map(|r| *r.value())
    }

    /// All relations, ordered by creation (ID order).
    pub fn all(&self) -> Vec<Relation> {
        let mut relations: Vec<Relation> = self.by_id.iter().map(|r| r.value().clone()).collect();
        relations.sort_by_key(|r| r.id);
        relations
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for RelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> ConceptId {
        ConceptId::new(n).unwrap()
    }

    #[test]
    fn unique_relations_get_distinct_names_per_domain() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();
        let stmt = StatementId::new("1");

        let a = reg
            .define_relationship(ids(1), "must provide", ids(2), Some(&stmt), "", UniquenessPolicy::Unique, &index)
            .unwrap()
            .unwrap();
        let b = reg
            .define_relationship(ids(3), "must provide", ids(2), Some(&stmt), "", UniquenessPolicy::Unique, &index)
            .unwrap()
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(reg.relation(a).unwrap().name, "must_provide");
        assert_eq!(reg.relation(b).unwrap().name, "must_provide'");
    }

    #[test]
    fn repeating_a_label_subject_pair_resolves_to_same_relation() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();

        let first = reg
            .define_relationship(ids(5), "must provide", ids(2), Some(&StatementId::new("1")), "", UniquenessPolicy::Unique, &index)
            .unwrap()
            .unwrap();
        // A different domain claims the next suffix in between.
        reg.define_relationship(ids(6), "must provide", ids(2), Some(&StatementId::new("2")), "", UniquenessPolicy::Unique, &index)
            .unwrap();
        let again = reg
            .define_relationship(ids(5), "must provide", ids(4), Some(&StatementId::new("3")), "", UniquenessPolicy::Unique, &index)
            .unwrap()
            .unwrap();

        assert_eq!(first, again);
        let relation = reg.relation(first).unwrap();
        assert_eq!(
            relation.comments,
            vec!["From statement: 1".to_string(), "From statement: 3".to_string()]
        );
    }

    #[test]
    fn shared_relations_reuse_across_domains() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();

        let a = reg
            .define_relationship(ids(1), "works for", ids(2), Some(&StatementId::new("1")), "", UniquenessPolicy::Shared, &index)
            .unwrap()
            .unwrap();
        let b = reg
            .define_relationship(ids(7), "works for", ids(8), Some(&StatementId::new("2")), "", UniquenessPolicy::Shared, &index)
            .unwrap()
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.relation(a).unwrap().comments.len(), 2);
    }

    #[test]
    fn existential_constraint_sets_flag() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();
        let id = reg
            .define_relationship(ids(1), "includes", ids(2), None, "some", UniquenessPolicy::Unique, &index)
            .unwrap()
            .unwrap();
        assert!(reg.relation(id).unwrap().existential);
    }

    #[test]
    fn collision_cap_is_enforced() {
        let reg = RelationRegistry::with_collision_cap(2);
        let index = StatementIndex::new();
        for n in 1..=3u64 {
            reg.define_relationship(ids(n), "governs", ids(10), None, "", UniquenessPolicy::Unique, &index)
                .unwrap();
        }
        let err = reg
            .define_relationship(ids(4), "governs", ids(10), None, "", UniquenessPolicy::Unique, &index)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::LexiError::Relation(RelationError::CollisionCapExceeded { .. })
        ));
    }

    #[test]
    fn triples_are_indexed_under_the_statement() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();
        let stmt = StatementId::new("12");
        reg.define_relationship(ids(1), "must provide", ids(2), Some(&stmt), "", UniquenessPolicy::Unique, &index)
            .unwrap();
        reg.define_relationship(ids(2), "must be provided to", ids(3), Some(&stmt), "", UniquenessPolicy::Unique, &index)
            .unwrap();

        let triples = index.triples_for(&stmt);
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].relation, "must_provide");
        assert_eq!(triples[1].relation, "must_be_provided_to");
    }

    #[test]
    fn resolved_name_falls_back_to_label() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();
        reg.define_relationship(ids(1), "aims at", ids(2), None, "", UniquenessPolicy::Unique, &index)
            .unwrap();
        reg.define_relationship(ids(3), "aims at", ids(2), None, "", UniquenessPolicy::Unique, &index)
            .unwrap();

        assert_eq!(reg.resolved_name("aims at", ids(1)), "aims_at");
        assert_eq!(reg.resolved_name("aims at", ids(3)), "aims_at'");
        // Shared relations and unknown pairs fall back to the label as given.
        assert_eq!(reg.resolved_name("aims at", ids(9)), "aims at");
    }

    #[test]
    fn empty_label_is_skipped() {
        let reg = RelationRegistry::new();
        let index = StatementIndex::new();
        let id = reg
            .define_relationship(ids(1), "  ", ids(2), Some(&StatementId::new("1")), "", UniquenessPolicy::Unique, &index)
            .unwrap();
        assert!(id.is_none());
        assert!(reg.is_empty());
        assert_eq!(index.triple_count(), 0);
    }
}
