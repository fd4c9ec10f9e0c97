//! Rule synthesis: activation-condition references become inference rules.
//!
//! For a governed statement `C` whose activation condition references
//! statement `A`, every relation triple recorded for `A` is paired with
//! every triple recorded for `C` to produce one rule: the `A` triple (plus
//! class-membership atoms) implies the `C` relation. When two concepts on
//! the body and head side coincide or sit on the same superclass chain,
//! their variable slots are aliased so the rule actually connects them.
//!
//! Rules are emitted as data ([`RuleRecord`]); nothing here evaluates them.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::condition::ActivationCondition;
use crate::ontology::concepts::ConceptRegistry;
use crate::ontology::index::StatementIndex;
use crate::ontology::{ConceptId, RelationTriple};
use crate::statement::StatementId;

/// The four variable slots a synthesized rule draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleVar {
    /// Body subject (unless aliased).
    X,
    /// Head subject.
    Y,
    /// Body object (unless aliased).
    Z,
    /// Head object.
    Q,
}

impl std::fmt::Display for RuleVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleVar::X => write!(f, "?x"),
            RuleVar::Y => write!(f, "?y"),
            RuleVar::Z => write!(f, "?z"),
            RuleVar::Q => write!(f, "?q"),
        }
    }
}

/// One predicate application over variable slots: a relation atom
/// (two arguments) or a concept-membership atom (one argument).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAtom {
    pub predicate: String,
    pub args: Vec<RuleVar>,
}

impl RuleAtom {
    pub fn membership(concept_name: impl Into<String>, var: RuleVar) -> Self {
        Self {
            predicate: concept_name.into(),
            args: vec![var],
        }
    }

    pub fn relation(name: impl Into<String>, subject: RuleVar, object: RuleVar) -> Self {
        Self {
            predicate: name.into(),
            args: vec![subject, object],
        }
    }
}

impl std::fmt::Display for RuleAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.predicate, args.join(", "))
    }
}

/// A synthesized inference rule: body atoms imply the head atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub body: Vec<RuleAtom>,
    pub head: RuleAtom,
}

impl std::fmt::Display for RuleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body: Vec<String> = self.body.iter().map(|a| a.to_string()).collect();
        write!(f, "{} -> {}", body.join(", "), self.head)
    }
}

/// Synthesizes rules from the statement relation index and concept registry.
///
/// Holds no state of its own beyond read access to both.
pub struct RuleSynthesizer<'a> {
    concepts: &'a ConceptRegistry,
    index: &'a StatementIndex,
}

impl<'a> RuleSynthesizer<'a> {
    pub fn new(concepts: &'a ConceptRegistry, index: &'a StatementIndex) -> Self {
        Self { concepts, index }
    }

    /// Synthesize every rule implied by a parsed activation condition on the
    /// governed statement. NOT conditions emit no rule and always log.
    pub fn rules_for_condition(
        &self,
        condition: &ActivationCondition,
        governed: &StatementId,
    ) -> Vec<RuleRecord> {
        match condition {
            ActivationCondition::Leaf(activation) => {
                self.rules_from_statements(activation, governed)
            }
            ActivationCondition::AnyOf(leaves) => leaves
                .iter()
                .flat_map(|leaf| self.rules_from_statements(leaf, governed))
                .collect(),
            ActivationCondition::Not(reference) => {
                warn!(
                    governed = governed.as_str(),
                    reference, "negated activation condition is not implemented, no rule emitted"
                );
                Vec::new()
            }
        }
    }

    /// Pair the activation statement's triples against the governed
    /// statement's triples.
    pub fn rules_from_statements(
        &self,
        activation: &StatementId,
        governed: &StatementId,
    ) -> Vec<RuleRecord> {
        let conclusion_triples = self.index.triples_for(governed);
        if conclusion_triples.is_empty() {
            warn!(
                statement = governed.as_str(),
                "no conclusion relations found for statement"
            );
            return Vec::new();
        }

        let activation_triples = self.index.triples_for(activation);
        if activation_triples.is_empty() {
            info!(
                statement = activation.as_str(),
                "no activation relations found for statement, checking subclasses"
            );
            let Some(default) = self.concepts.default_subclass(activation) else {
                warn!(
                    statement = activation.as_str(),
                    "no default subclass recorded for statement, no rule emitted"
                );
                return Vec::new();
            };
            return conclusion_triples
                .iter()
                .map(|head| self.fallback_rule(default, head))
                .collect();
        }

        let mut rules = Vec::new();
        for head in &conclusion_triples {
            for body in &activation_triples {
                rules.push(self.relational_rule(body, head));
            }
        }
        rules
    }

    /// Two-sided rule: the body triple plus membership atoms imply the head
    /// relation. Aliasing checks run in a fixed order; later checks override.
    fn relational_rule(&self, body: &RelationTriple, head: &RelationTriple) -> RuleRecord {
        let mut s1 = RuleVar::X;
        let mut o1 = RuleVar::Z;
        if self.related(body.subject, head.subject) {
            s1 = RuleVar::Y;
        }
        if self.related(body.subject, head.object) {
            s1 = RuleVar::Q;
        }
        if self.related(body.object, head.object) {
            o1 = RuleVar::Q;
        }
        if self.related(body.object, head.subject) {
            o1 = RuleVar::Y;
        }

        RuleRecord {
            body: vec![
                RuleAtom::membership(self.concepts.name_of(body.subject), s1),
                RuleAtom::membership(self.concepts.name_of(body.object), o1),
                RuleAtom::membership(self.concepts.name_of(head.subject), RuleVar::Y),
                RuleAtom::membership(self.concepts.name_of(head.object), RuleVar::Q),
                RuleAtom::relation(body.relation.clone(), s1, o1),
            ],
            head: RuleAtom::relation(head.relation.clone(), RuleVar::Y, RuleVar::Q),
        }
    }

    /// Fallback rule: membership in the activation statement's default
    /// subclass alone implies the head relation.
    fn fallback_rule(&self, default_subclass: ConceptId, head: &RelationTriple) -> RuleRecord {
        let mut s1 = RuleVar::X;
        if self.related(default_subclass, head.subject) {
            s1 = RuleVar::Y;
        }
        if self.related(default_subclass, head.object) {
            s1 = RuleVar::Q;
        }

        RuleRecord {
            body: vec![
                RuleAtom::membership(self.concepts.name_of(default_subclass), s1),
                RuleAtom::membership(self.concepts.name_of(head.subject), RuleVar::Y),
                RuleAtom::membership(self.concepts.name_of(head.object), RuleVar::Q),
            ],
            head: RuleAtom::relation(head.relation.clone(), RuleVar::Y, RuleVar::Q),
        }
    }

    fn related(&self, a: ConceptId, b: ConceptId) -> bool {
        self.concepts.related_by_subclass(a, b)
    }
}
