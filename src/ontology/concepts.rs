//! Concept registry: canonical-name keyed class hierarchy.
//!
//! The registry owns every [`Concept`] created during a run. Names are
//! canonicalized on the way in ([`crate::names::concept_name`]), so lookups
//! by raw annotation text and by canonical name hit the same entry.

use std::collections::HashSet;
use std::sync::LazyLock;

use dashmap::DashMap;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{ConceptError, LexiResult};
use crate::names;
use crate::statement::StatementId;

use super::{Concept, ConceptId, IdAllocator};

/// Reserved composite marker that signals a likely annotation error when it
/// survives into a class label (e.g. `AND[12.1,12.2]`).
static ILLEGAL_COMPOSITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AND\[[\d\.,]+\]").unwrap());

/// One row of a subclass batch: a superclass label plus suffix cells that
/// together form a compound subclass label.
#[derive(Debug, Clone, Default)]
pub struct SubclassRecord {
    pub superclass: String,
    pub suffix: Vec<String>,
    /// Statement this row came from; used for provenance and for recording
    /// the statement's default subclass.
    pub statement: Option<StatementId>,
}

/// Canonical-name keyed concept store.
pub struct ConceptRegistry {
    by_name: DashMap<String, ConceptId>,
    by_id: DashMap<ConceptId, Concept>,
    /// First subclass created while processing a statement; consumed by the
    /// rule synthesizer's fallback path.
    default_subclass: DashMap<StatementId, ConceptId>,
    alloc: IdAllocator,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            by_id: DashMap::new(),
            default_subclass: DashMap::new(),
            alloc: IdAllocator::new(),
        }
    }

    /// Pure lookup by raw label; never creates.
    pub fn get(&self, raw: &str) -> Option<ConceptId> {
        let name = names::concept_name(raw)?;
        self.by_name.get(&name).map(|r| *r.value())
    }

    /// Fetch a concept record by ID.
    pub fn concept(&self, id: ConceptId) -> Option<Concept> {
        self.by_id.get(&id).map(|r| r.value().clone())
    }

    /// Resolve an ID to its canonical name, falling back to `con:{id}`.
    pub fn name_of(&self, id: ConceptId) -> String {
        self.by_id
            .get(&id)
            .map(|r| r.value().name.clone())
            .unwrap_or_else(|| format!("con:{}", id.get()))
    }

    /// Create a root concept (no superclass).
    ///
    /// Returns `Ok(None)` when the raw name canonicalizes to nothing; if the
    /// canonical name already exists the existing concept is returned.
    pub fn create_base(&self, raw: &str) -> LexiResult<Option<ConceptId>> {
        let Some(name) = names::concept_name(raw) else {
            return Ok(None);
        };
        self.insert(name, None).map(Some)
    }

    /// Create (or return) a concept as a child of `superclass`.
    ///
    /// An absent superclass is a per-record configuration error; an empty
    /// canonical name yields `Ok(None)`.
    pub fn create(&self, raw: &str, superclass: Option<ConceptId>) -> LexiResult<Option<ConceptId>> {
        let Some(superclass) = superclass else {
            return Err(ConceptError::MissingSuperclass {
                name: raw.to_string(),
            }
            .into());
        };
        let Some(name) = names::concept_name(raw) else {
            return Ok(None);
        };
        self.insert(name, Some(superclass)).map(Some)
    }

    fn insert(&self, name: String, superclass: Option<ConceptId>) -> LexiResult<ConceptId> {
        if let Some(existing) = self.by_name.get(&name) {
            return Ok(*existing.value());
        }
        let id = self
            .alloc
            .next_raw()
            .map(ConceptId)
            .ok_or(ConceptError::AllocatorExhausted)?;
        debug!(%id, name, superclass = ?superclass.map(|s| s.get()), "creating concept");
        self.by_name.insert(name.clone(), id);
        self.by_id.insert(
            id,
            Concept {
                id,
                name,
                superclass,
                statements: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Record that `statement` caused or reused `concept`.
    pub fn note_statement(&self, concept: ConceptId, statement: &StatementId) {
        if let Some(mut entry) = self.by_id.get_mut(&concept)
            && !entry.statements.contains(statement)
        {
            entry.statements.push(statement.clone());
        }
    }

    /// Batch-create superclass/subclass pairs from annotation rows.
    ///
    /// For each record the superclass is resolved or created as a base
    /// concept; when the first suffix cell is non-empty, a compound subclass
    /// label (superclass label, optional connector word, suffix cells) is
    /// created under it. Rows matching the reserved `AND[…]` pattern are
    /// flagged as likely annotation errors but still processed; per-record
    /// failures are logged and do not abort the batch.
    pub fn create_from_records(
        &self,
        records: &[SubclassRecord],
        connector_word: Option<&str>,
    ) -> Vec<(ConceptId, Option<ConceptId>)> {
        let mut created = Vec::new();
        let mut seen = HashSet::new();
        for (row, record) in records.iter().enumerate() {
            match self.create_one(row, record, connector_word) {
                Ok(Some(pair)) => {
                    if seen.insert(pair) {
                        created.push(pair);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(row, error = %e, "skipping subclass record"),
            }
        }
        created
    }

    fn create_one(
        &self,
        row: usize,
        record: &SubclassRecord,
        connector_word: Option<&str>,
    ) -> LexiResult<Option<(ConceptId, Option<ConceptId>)>> {
        if ILLEGAL_COMPOSITE.is_match(&record.superclass) {
            report_annotation_error(row, &record.superclass);
        }

        let superclass = match self.get(&record.superclass) {
            Some(id) => Some(id),
            None => self.create_base(&record.superclass)?,
        };

        let suffix_text = record.suffix.join(" ");
        if ILLEGAL_COMPOSITE.is_match(&suffix_text) {
            report_annotation_error(row, &suffix_text);
        }

        let has_suffix = record.suffix.first().is_some_and(|s| !s.is_empty());
        let subclass = if has_suffix {
            let mut parts = vec![record.superclass.as_str()];
            if let Some(word) = connector_word {
                parts.push(word);
            }
            parts.extend(record.suffix.iter().map(String::as_str));
            self.create(&parts.join(" "), superclass)?
        } else {
            None
        };

        let Some(superclass) = superclass else {
            // Superclass label canonicalized to nothing and no subclass was
            // requested; there is no concept to report.
            return Ok(None);
        };

        if let Some(stmt) = &record.statement {
            self.note_statement(superclass, stmt);
            if let Some(sub) = subclass {
                self.note_statement(sub, stmt);
                self.set_default_subclass(stmt, sub);
            }
        }

        Ok(Some((superclass, subclass)))
    }

    /// Record the default subclass for a statement (first writer wins).
    pub fn set_default_subclass(&self, statement: &StatementId, concept: ConceptId) {
        self.default_subclass
            .entry(statement.clone())
            .or_insert(concept);
    }

    /// The default subclass recorded while processing `statement`, if any.
    pub fn default_subclass(&self, statement: &StatementId) -> Option<ConceptId> {
        self.default_subclass.get(statement).map(|r| *r.value())
    }

    /// Whether `a` equals `b` or either is an ancestor of the other.
    pub fn related_by_subclass(&self, a: ConceptId, b: ConceptId) -> bool {
        a == b || self.is_ancestor(b, a) || self.is_ancestor(a, b)
    }

    /// Whether `ancestor` appears on `descendant`'s superclass chain.
    fn is_ancestor(&self, ancestor: ConceptId, descendant: ConceptId) -> bool {
        let mut visited = HashSet::new();
        let mut current = descendant;
        while let Some(parent) = self.by_id.get(&current).and_then(|c| c.superclass) {
            if parent == ancestor {
                return true;
            }
            if !visited.insert(parent) {
                break;
            }
            current = parent;
        }
        false
    }

    /// All concepts, ordered by creation (ID order).
    pub fn all(&self) -> Vec<Concept> {
        let mut concepts: Vec<Concept> = self.by_id.iter().map(|r| r.value().clone()).collect();
        concepts.sort_by_key(|c| c.id);
        concepts
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for ConceptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn report_annotation_error(row: usize, label: &str) {
    warn!(row, label, "possible annotation error");
}
