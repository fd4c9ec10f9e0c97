//! Activation-condition reference parsing.
//!
//! An activation-condition reference names the statement(s) whose truth
//! gates the referencing statement's obligation. References are parsed once
//! into a finite AST and never re-parsed during rule synthesis.
//!
//! Supported forms, checked in order:
//! - `OR[a,b,c]`: one level of alternatives; elements are atomic leaves even
//!   when themselves composite
//! - `AND…`: not decomposed; passed through as a single opaque leaf
//! - `NOT…`: parsed but never expanded into a rule
//! - anything else: a single leaf statement reference (enclosing brackets
//!   stripped)

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::statement::StatementId;

/// Parsed activation-condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationCondition {
    /// Reference to a single statement.
    Leaf(StatementId),
    /// One level of alternatives: any referenced statement activates.
    AnyOf(Vec<StatementId>),
    /// Negated reference; recognized but unsupported, no rule is emitted.
    Not(String),
}

/// Parse a raw activation-condition reference.
///
/// Empty input parses to `None` ("no condition").
pub fn parse(raw: &str) -> Option<ActivationCondition> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with("OR") {
        let inner = raw[2..]
            .trim_start_matches('[')
            .trim_end_matches(']');
        let leaves: Vec<StatementId> = inner
            .split(',')
            .map(|part| StatementId::new(part.trim()))
            .collect();
        return Some(ActivationCondition::AnyOf(leaves));
    }

    if raw.starts_with("AND") {
        // Conjunctive decomposition is not implemented; the whole reference
        // is carried as one opaque leaf.
        warn!(reference = raw, "AND activation condition not decomposed, treated as opaque leaf");
        return Some(ActivationCondition::Leaf(StatementId::new(raw)));
    }

    if let Some(inner) = raw.strip_prefix("NOT") {
        return Some(ActivationCondition::Not(inner.trim().to_string()));
    }

    Some(ActivationCondition::Leaf(StatementId::new(
        raw.trim_matches(['[', ']']),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_no_condition() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn single_leaf() {
        assert_eq!(
            parse("12"),
            Some(ActivationCondition::Leaf(StatementId::new("12")))
        );
    }

    #[test]
    fn bracketed_leaf_is_stripped() {
        assert_eq!(
            parse("[34.2]"),
            Some(ActivationCondition::Leaf(StatementId::new("34.2")))
        );
    }

    #[test]
    fn or_list_splits_one_level() {
        assert_eq!(
            parse("OR[1,2.1,3]"),
            Some(ActivationCondition::AnyOf(vec![
                StatementId::new("1"),
                StatementId::new("2.1"),
                StatementId::new("3"),
            ]))
        );
    }

    #[test]
    fn and_stays_opaque() {
        assert_eq!(
            parse("AND[1,2]"),
            Some(ActivationCondition::Leaf(StatementId::new("AND[1,2]")))
        );
    }

    #[test]
    fn not_is_recognized_but_unexpanded() {
        assert_eq!(
            parse("NOT 7"),
            Some(ActivationCondition::Not("7".to_string()))
        );
    }
}
