//! Ontology store collaborator: where compiled output is handed off.
//!
//! The compiler never persists anything itself; it pushes concepts,
//! relations, and rules into an [`OntologyStore`] and asks it to save. The
//! bundled [`JsonOntologyStore`] collects label-resolved export records and
//! writes one pretty-printed JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LexiResult, StoreError};
use crate::rules::RuleRecord;

/// External consumer of the compiled ontology.
pub trait OntologyStore {
    /// Register a concept, optionally under a superclass registered earlier.
    fn create_concept(&mut self, name: &str, superclass: Option<&str>) -> LexiResult<()>;

    /// Register a relation edge between two registered concepts.
    fn create_relation(
        &mut self,
        name: &str,
        domain: &str,
        range: &str,
        existential: bool,
        comments: &[String],
    ) -> LexiResult<()>;

    /// Append a synthesized inference rule.
    fn add_rule(&mut self, rule: &RuleRecord) -> LexiResult<()>;

    /// Persist everything collected so far.
    fn save(&self, path: &Path) -> LexiResult<()>;
}

/// Exported concept with resolved names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptExport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
}

/// Exported relation with resolved names for both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationExport {
    pub name: String,
    pub domain: String,
    pub range: String,
    pub existential: bool,
    pub comments: Vec<String>,
}

/// Exported rule: the structured record plus a rendered form for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExport {
    pub rule: RuleRecord,
    pub rendered: String,
}

/// The whole compiled ontology as one serializable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologyExport {
    pub concepts: Vec<ConceptExport>,
    pub relations: Vec<RelationExport>,
    pub rules: Vec<RuleExport>,
}

/// JSON-backed ontology store.
#[derive(Debug, Default)]
pub struct JsonOntologyStore {
    export: OntologyExport,
}

impl JsonOntologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected export document.
    pub fn export(&self) -> &OntologyExport {
        &self.export
    }
}

impl OntologyStore for JsonOntologyStore {
    fn create_concept(&mut self, name: &str, superclass: Option<&str>) -> LexiResult<()> {
        self.export.concepts.push(ConceptExport {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
        });
        Ok(())
    }

    fn create_relation(
        &mut self,
        name: &str,
        domain: &str,
        range: &str,
        existential: bool,
        comments: &[String],
    ) -> LexiResult<()> {
        self.export.relations.push(RelationExport {
            name: name.to_string(),
            domain: domain.to_string(),
            range: range.to_string(),
            existential,
            comments: comments.to_vec(),
        });
        Ok(())
    }

    fn add_rule(&mut self, rule: &RuleRecord) -> LexiResult<()> {
        self.export.rules.push(RuleExport {
            rule: rule.clone(),
            rendered: rule.to_string(),
        });
        Ok(())
    }

    fn save(&self, path: &Path) -> LexiResult<()> {
        let json = serde_json::to_string_pretty(&self.export).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        std::fs::write(path, json).map_err(|source| StoreError::Io { source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleAtom, RuleVar};

    #[test]
    fn store_collects_in_order() {
        let mut store = JsonOntologyStore::new();
        store.create_concept("Employer", None).unwrap();
        store
            .create_concept("SmallEmployer", Some("Employer"))
            .unwrap();
        store
            .create_relation(
                "must_provide",
                "Employer",
                "PaidSickLeave",
                false,
                &["From statement: 1".to_string()],
            )
            .unwrap();

        let export = store.export();
        assert_eq!(export.concepts.len(), 2);
        assert_eq!(export.concepts[1].superclass.as_deref(), Some("Employer"));
        assert_eq!(export.relations[0].name, "must_provide");
    }

    #[test]
    fn save_writes_readable_json() {
        let mut store = JsonOntologyStore::new();
        store.create_concept("Employer", None).unwrap();
        store
            .add_rule(&RuleRecord {
                body: vec![RuleAtom::membership("Employer", RuleVar::Y)],
                head: RuleAtom::relation("Violates", RuleVar::Y, RuleVar::Q),
            })
            .unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ontology.json");
        store.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: OntologyExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, *store.export());
        assert!(back.rules[0].rendered.contains("Violates(?y, ?q)"));
    }
}
