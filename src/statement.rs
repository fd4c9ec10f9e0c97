//! Statement records: one typed row per annotated institutional statement.
//!
//! The upstream tabular collaborator hands over rows already normalized
//! (blank-filled, whitespace-trimmed). Each row is classified along two axes:
//! IG syntax (regulative vs. constitutive) and statement function
//! (proper regulative/constitutive vs. observation).

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier of a source statement (e.g. `"12"` or `"34.2"`).
///
/// Kept as a string: statement numbers in the annotation sheets use dotted
/// sub-numbering that must round-trip exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StatementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StatementId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// IG syntax classification of a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgSyntax {
    #[default]
    Regulative,
    Constitutive,
}

/// Statement function: proper statement or side observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementRole {
    Regulative,
    Constitutive,
    #[default]
    Observation,
}

/// One normalized annotation row.
///
/// Regulative and constitutive columns coexist on the same record; whichever
/// set is unused for a given syntax is blank. All content fields default to
/// the empty string so partially-filled rows deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub statement_no: StatementId,
    pub syntax: IgSyntax,
    pub function: StatementRole,
    /// Raw statement text, kept for audit output only.
    #[serde(default)]
    pub statement: String,

    // Regulative columns.
    #[serde(default)]
    pub attribute: String,
    #[serde(default)]
    pub attribute_property: String,
    #[serde(default)]
    pub deontic: String,
    #[serde(default)]
    pub aim: String,
    #[serde(default)]
    pub direct_object: String,
    #[serde(default)]
    pub direct_object_property: String,
    #[serde(default)]
    pub indirect_object: String,
    #[serde(default)]
    pub indirect_object_property: String,

    // Constitutive columns.
    #[serde(default)]
    pub constituted_entity: String,
    #[serde(default)]
    pub constituted_entity_property: String,
    #[serde(default)]
    pub modal: String,
    #[serde(default)]
    pub function_verb: String,
    #[serde(default)]
    pub constituted_properties: String,
    #[serde(default)]
    pub constituted_properties_property: String,

    // Cross-statement references.
    #[serde(default)]
    pub activation_condition: String,
    #[serde(default)]
    pub activation_condition_ref: String,
    #[serde(default)]
    pub execution_constraint: String,
    #[serde(default)]
    pub execution_constraint_ref: String,
}

impl StatementRecord {
    pub fn is_observation(&self) -> bool {
        self.function == StatementRole::Observation
    }
}

/// Join annotation cells into one label, skipping blanks.
pub fn join_cells(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Schema invariant check: observations carry no activation condition.
///
/// Violations are a data-quality warning, never fatal.
pub fn check_observation_constraints(records: &[StatementRecord]) {
    let problematic: Vec<&StatementId> = records
        .iter()
        .filter(|r| r.is_observation() && !r.activation_condition.is_empty())
        .map(|r| &r.statement_no)
        .collect();
    if !problematic.is_empty() {
        warn!(
            statements = ?problematic.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "observations with non-empty activation condition"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_id_round_trips_dotted_numbers() {
        let id = StatementId::new("34.2");
        assert_eq!(id.to_string(), "34.2");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"34.2\"");
        let back: StatementId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn record_deserializes_with_blank_defaults() {
        let json = r#"{
            "statement_no": "7",
            "syntax": "regulative",
            "function": "regulative",
            "attribute": "Employer",
            "deontic": "must",
            "aim": "provide",
            "direct_object": "paid sick leave"
        }"#;
        let rec: StatementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.statement_no.as_str(), "7");
        assert_eq!(rec.syntax, IgSyntax::Regulative);
        assert_eq!(rec.function, StatementRole::Regulative);
        assert_eq!(rec.attribute, "Employer");
        assert_eq!(rec.indirect_object, "");
        assert_eq!(rec.activation_condition_ref, "");
    }

    #[test]
    fn join_cells_skips_blanks() {
        assert_eq!(join_cells(&["Employer", ""]), "Employer");
        assert_eq!(join_cells(&["paid", "sick leave"]), "paid sick leave");
        assert_eq!(join_cells(&["", ""]), "");
    }

    #[test]
    fn observation_role_detected() {
        let rec = StatementRecord {
            function: StatementRole::Observation,
            ..Default::default()
        };
        assert!(rec.is_observation());
    }
}
