//! Compile pipeline: statement records in, ontology + rules out.
//!
//! The [`Compiler`] owns the registries and drives the whole flow in a
//! fixed, deterministic order — the order the record source yields. Naming
//! outcomes depend on that order (collision suffixes are first-writer-wins),
//! so statement processing is deliberately sequential.
//!
//! Passes, in order:
//! 1. schema checks (observation activation conditions)
//! 2. concept creation per statement group
//! 3. relation extraction (regulative aim, observation aim, constitutive
//!    modal-function), populating the statement relation index
//! 4. store emission of concepts and relations
//! 5. activation-condition rule synthesis

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::condition;
use crate::error::{LexiResult, PipelineError};
use crate::inflect::{self, EnglishInflector, Inflector};
use crate::ontology::concepts::{ConceptRegistry, SubclassRecord};
use crate::ontology::index::StatementIndex;
use crate::ontology::relations::{DEFAULT_COLLISION_CAP, RelationRegistry};
use crate::ontology::{ConceptId, RelationId, UniquenessPolicy};
use crate::rules::RuleSynthesizer;
use crate::statement::{
    IgSyntax, StatementRecord, StatementRole, check_observation_constraints, join_cells,
};
use crate::store::OntologyStore;

/// Tunable knobs for a compile run, loadable from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Word inserted between an entity and its constituting function when
    /// building observation subclass labels (e.g. "Employee *that* …").
    pub connector_word: Option<String>,
    /// Bound on the relation-name collision search.
    pub collision_cap: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            connector_word: Some("that".to_string()),
            collision_cap: DEFAULT_COLLISION_CAP,
        }
    }
}

impl CompileOptions {
    /// Load options from a TOML file.
    pub fn load(path: &Path) -> LexiResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::OptionsParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let options: Self = toml::from_str(&text).map_err(|e| PipelineError::OptionsParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> LexiResult<()> {
        if self.collision_cap == 0 {
            return Err(PipelineError::InvalidOptions {
                message: "collision_cap must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Read statement records from a JSON file (an array of normalized rows).
pub fn load_records(path: &Path) -> LexiResult<Vec<StatementRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::RecordsRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let records = serde_json::from_str(&text).map_err(|e| PipelineError::RecordsRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(records)
}

/// Counters reported at the end of a compile run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompileSummary {
    pub statements: usize,
    pub concepts: usize,
    pub relations: usize,
    pub forward_relations: usize,
    pub passive_relations: usize,
    pub skipped_relations: usize,
    pub rules: usize,
}

impl std::fmt::Display for CompileSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "compile summary")?;
        writeln!(f, "  statements:        {}", self.statements)?;
        writeln!(f, "  concepts:          {}", self.concepts)?;
        writeln!(f, "  relations:         {}", self.relations)?;
        writeln!(f, "  forward relations: {}", self.forward_relations)?;
        writeln!(f, "  passive relations: {}", self.passive_relations)?;
        writeln!(f, "  skipped relations: {}", self.skipped_relations)?;
        writeln!(f, "  rules:             {}", self.rules)?;
        Ok(())
    }
}

/// The Institutional Grammar ontology compiler.
///
/// Owns the concept registry, relation registry, and statement relation
/// index; registries live for the whole process and are never cleared
/// between batches.
pub struct Compiler {
    options: CompileOptions,
    concepts: ConceptRegistry,
    relations: RelationRegistry,
    index: StatementIndex,
    inflector: Box<dyn Inflector>,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> LexiResult<Self> {
        options.validate()?;
        let relations = RelationRegistry::with_collision_cap(options.collision_cap);
        Ok(Self {
            options,
            concepts: ConceptRegistry::new(),
            relations,
            index: StatementIndex::new(),
            inflector: Box::new(EnglishInflector),
        })
    }

    /// Swap the inflection collaborator.
    pub fn with_inflector(mut self, inflector: Box<dyn Inflector>) -> Self {
        self.inflector = inflector;
        self
    }

    pub fn concepts(&self) -> &ConceptRegistry {
        &self.concepts
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub fn index(&self) -> &StatementIndex {
        &self.index
    }

    /// Run the full pipeline over one batch of records, handing the result
    /// to `store` (without saving it).
    pub fn compile(
        &self,
        records: &[StatementRecord],
        store: &mut dyn OntologyStore,
    ) -> LexiResult<CompileSummary> {
        info!(records = records.len(), "starting compile run");
        check_observation_constraints(records);

        let con_proper: Vec<&StatementRecord> = records
            .iter()
            .filter(|r| {
                r.syntax == IgSyntax::Constitutive
                    && r.function == StatementRole::Constitutive
                    && !r.constituted_entity.is_empty()
            })
            .collect();
        let con_obs: Vec<&StatementRecord> = records
            .iter()
            .filter(|r| r.syntax == IgSyntax::Constitutive && r.is_observation())
            .collect();
        let reg_proper: Vec<&StatementRecord> = records
            .iter()
            .filter(|r| r.syntax == IgSyntax::Regulative && r.function == StatementRole::Regulative)
            .collect();
        let reg_obs: Vec<&StatementRecord> = records
            .iter()
            .filter(|r| r.syntax == IgSyntax::Regulative && r.is_observation())
            .collect();

        self.create_concepts(&con_proper, &con_obs, &reg_proper, &reg_obs);

        let mut summary = CompileSummary {
            statements: records.len(),
            ..Default::default()
        };
        self.observation_aim_relations(&reg_obs, &mut summary);
        self.regulative_aim_relations(&reg_proper, &mut summary);
        self.constitutive_relations(&con_proper, &mut summary);

        for concept in self.concepts.all() {
            let superclass = concept.superclass.map(|id| self.concepts.name_of(id));
            store.create_concept(&concept.name, superclass.as_deref())?;
        }
        for relation in self.relations.all() {
            store.create_relation(
                &relation.name,
                &self.concepts.name_of(relation.domain),
                &self.concepts.name_of(relation.range),
                relation.existential,
                &relation.comments,
            )?;
        }

        summary.rules = self.synthesize_rules(records, store)?;
        summary.concepts = self.concepts.len();
        summary.relations = self.relations.len();
        info!(%summary, "compile run finished");
        Ok(summary)
    }

    // -- concept pass -------------------------------------------------------

    fn create_concepts(
        &self,
        con_proper: &[&StatementRecord],
        con_obs: &[&StatementRecord],
        reg_proper: &[&StatementRecord],
        reg_obs: &[&StatementRecord],
    ) {
        // Constitutive observations: compound "entity <connector> function
        // properties" subclasses.
        let observation_rows: Vec<SubclassRecord> = con_obs
            .iter()
            .map(|r| SubclassRecord {
                superclass: r.constituted_entity.clone(),
                suffix: vec![
                    r.function_verb.clone(),
                    r.constituted_properties.clone(),
                    r.constituted_properties_property.clone(),
                ],
                statement: Some(r.statement_no.clone()),
            })
            .collect();
        self.concepts
            .create_from_records(&observation_rows, self.options.connector_word.as_deref());

        // Constitutive proper: entity and constituted-properties hierarchies.
        // The entity rows come first so a statement's default subclass is the
        // constituted entity subclass.
        let entity_rows: Vec<SubclassRecord> = con_proper
            .iter()
            .map(|r| SubclassRecord {
                superclass: r.constituted_entity.clone(),
                suffix: vec![r.constituted_entity_property.clone()],
                statement: Some(r.statement_no.clone()),
            })
            .collect();
        self.concepts.create_from_records(&entity_rows, None);
        let property_rows: Vec<SubclassRecord> = con_proper
            .iter()
            .map(|r| SubclassRecord {
                superclass: r.constituted_properties.clone(),
                suffix: vec![r.constituted_properties_property.clone()],
                statement: Some(r.statement_no.clone()),
            })
            .collect();
        self.concepts.create_from_records(&property_rows, None);

        // Regulative (observations then proper): attribute, direct object,
        // and indirect object hierarchies.
        for group in [reg_obs, reg_proper] {
            for (superclass, suffix) in [
                (field(|r| &r.attribute), field(|r| &r.attribute_property)),
                (
                    field(|r| &r.direct_object),
                    field(|r| &r.direct_object_property),
                ),
                (
                    field(|r| &r.indirect_object),
                    field(|r| &r.indirect_object_property),
                ),
            ] {
                let rows: Vec<SubclassRecord> = group
                    .iter()
                    .map(|r| SubclassRecord {
                        superclass: superclass(r).clone(),
                        suffix: vec![suffix(r).clone()],
                        statement: Some(r.statement_no.clone()),
                    })
                    .collect();
                self.concepts.create_from_records(&rows, None);
            }
        }
    }

    // -- relation pass ------------------------------------------------------

    /// Observation aim relations are shared: the same verb names the same
    /// physical relation regardless of which class it is observed on.
    fn observation_aim_relations(&self, records: &[&StatementRecord], summary: &mut CompileSummary) {
        let mut forward = 0usize;
        let mut passive = 0usize;
        for r in records {
            let subject = self
                .concepts
                .get(&join_cells(&[&r.attribute, &r.attribute_property]));
            let object = self
                .concepts
                .get(&join_cells(&[&r.direct_object, &r.direct_object_property]));
            let (Some(subject), Some(object)) = (subject, object) else {
                self.report_missing(r, subject, object);
                summary.skipped_relations += 1;
                continue;
            };
            if self
                .try_define(subject, &r.aim, object, r, "", UniquenessPolicy::Shared)
                .is_some()
            {
                forward += 1;
                let indirect = self.concepts.get(&join_cells(&[
                    &r.indirect_object,
                    &r.indirect_object_property,
                ]));
                if let Some(indirect) = indirect {
                    let label = inflect::passive_label(&r.aim, self.inflector.as_ref());
                    if self
                        .try_define(object, &label, indirect, r, "", UniquenessPolicy::Shared)
                        .is_some()
                    {
                        passive += 1;
                    }
                }
            }
        }
        info!(forward, passive, "observation aim relations defined");
        summary.forward_relations += forward;
        summary.passive_relations += passive;
    }

    /// Regulative aim relations are unique per domain: "<deontic> <aim>" from
    /// the attribute to the direct object, plus the passive
    /// "<deontic> be <participle> to" from the direct object to the indirect
    /// object.
    fn regulative_aim_relations(&self, records: &[&StatementRecord], summary: &mut CompileSummary) {
        let mut forward = 0usize;
        let mut passive = 0usize;
        for r in records {
            let subject = self
                .concepts
                .get(&join_cells(&[&r.attribute, &r.attribute_property]));
            let object = self
                .concepts
                .get(&join_cells(&[&r.direct_object, &r.direct_object_property]));
            let (Some(subject), Some(object)) = (subject, object) else {
                self.report_missing(r, subject, object);
                summary.skipped_relations += 1;
                continue;
            };
            let label = join_cells(&[&r.deontic, &r.aim]);
            if self
                .try_define(subject, &label, object, r, "", UniquenessPolicy::Unique)
                .is_some()
            {
                forward += 1;
                let indirect = self.concepts.get(&join_cells(&[
                    &r.indirect_object,
                    &r.indirect_object_property,
                ]));
                if let Some(indirect) = indirect {
                    let label =
                        inflect::passive_deontic_label(&r.deontic, &r.aim, self.inflector.as_ref());
                    if self
                        .try_define(object, &label, indirect, r, "", UniquenessPolicy::Unique)
                        .is_some()
                    {
                        passive += 1;
                    }
                }
            }
        }
        info!(forward, passive, "regulative aim relations defined");
        summary.forward_relations += forward;
        summary.passive_relations += passive;
    }

    /// Constitutive modal-function relations: "<modal> <function>" (or the
    /// bare function) from the constituted entity to its properties.
    fn constitutive_relations(&self, records: &[&StatementRecord], summary: &mut CompileSummary) {
        for r in records {
            let subject = self.concepts.get(&join_cells(&[
                &r.constituted_entity,
                &r.constituted_entity_property,
            ]));
            let object = self.concepts.get(&join_cells(&[
                &r.constituted_properties,
                &r.constituted_properties_property,
            ]));
            let (Some(subject), Some(object)) = (subject, object) else {
                self.report_missing(r, subject, object);
                summary.skipped_relations += 1;
                continue;
            };
            let label = if r.modal.is_empty() {
                r.function_verb.clone()
            } else {
                join_cells(&[&r.modal, &r.function_verb])
            };
            self.try_define(subject, &label, object, r, "", UniquenessPolicy::Unique);
        }
    }

    /// Define a relation, recording concept provenance; registry errors
    /// (collision cap, exhaustion) skip the relation instead of aborting the
    /// batch.
    fn try_define(
        &self,
        subject: ConceptId,
        raw_label: &str,
        object: ConceptId,
        record: &StatementRecord,
        constraint: &str,
        policy: UniquenessPolicy,
    ) -> Option<RelationId> {
        match self.relations.define_relationship(
            subject,
            raw_label,
            object,
            Some(&record.statement_no),
            constraint,
            policy,
            &self.index,
        ) {
            Ok(Some(id)) => {
                self.concepts.note_statement(subject, &record.statement_no);
                self.concepts.note_statement(object, &record.statement_no);
                Some(id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    statement = record.statement_no.as_str(),
                    label = raw_label,
                    error = %e,
                    "skipping relation"
                );
                None
            }
        }
    }

    fn report_missing(
        &self,
        record: &StatementRecord,
        subject: Option<ConceptId>,
        object: Option<ConceptId>,
    ) {
        warn!(
            statement = record.statement_no.as_str(),
            subject_found = subject.is_some(),
            object_found = object.is_some(),
            "object or subject is missing"
        );
    }

    // -- rule pass ----------------------------------------------------------

    fn synthesize_rules(
        &self,
        records: &[StatementRecord],
        store: &mut dyn OntologyStore,
    ) -> LexiResult<usize> {
        let synthesizer = RuleSynthesizer::new(&self.concepts, &self.index);
        let mut count = 0usize;
        for r in records {
            if r.is_observation() || r.activation_condition_ref.is_empty() {
                continue;
            }
            let Some(cond) = condition::parse(&r.activation_condition_ref) else {
                continue;
            };
            for rule in synthesizer.rules_for_condition(&cond, &r.statement_no) {
                info!(rule = %rule, "adding rule");
                store.add_rule(&rule)?;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Helper so the regulative column pairs can be listed as data.
fn field(f: fn(&StatementRecord) -> &String) -> fn(&StatementRecord) -> &String {
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementId;
    use crate::store::JsonOntologyStore;

    fn regulative(no: &str, attr: &str, deontic: &str, aim: &str, dobj: &str) -> StatementRecord {
        StatementRecord {
            statement_no: StatementId::new(no),
            syntax: IgSyntax::Regulative,
            function: StatementRole::Regulative,
            attribute: attr.to_string(),
            deontic: deontic.to_string(),
            aim: aim.to_string(),
            direct_object: dobj.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn options_default_and_validation() {
        let options = CompileOptions::default();
        assert_eq!(options.connector_word.as_deref(), Some("that"));
        options.validate().unwrap();

        let bad = CompileOptions {
            collision_cap: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn options_parse_from_toml() {
        let options: CompileOptions =
            toml::from_str("connector_word = \"which\"\ncollision_cap = 8\n").unwrap();
        assert_eq!(options.connector_word.as_deref(), Some("which"));
        assert_eq!(options.collision_cap, 8);
    }

    #[test]
    fn regulative_statement_produces_concepts_and_relations() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        let records = vec![regulative("1", "Employer", "must", "provide", "paid sick leave")];
        let summary = compiler.compile(&records, &mut store).unwrap();

        assert_eq!(summary.forward_relations, 1);
        assert_eq!(summary.passive_relations, 0);
        assert!(compiler.concepts().get("Employer").is_some());
        assert!(compiler.concepts().get("paid sick leave").is_some());
        assert!(compiler.relations().get_by_name("must_provide").is_some());
    }

    #[test]
    fn passive_relation_needs_indirect_object() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        let mut record = regulative("1", "Employer", "must", "provide", "paid sick leave");
        record.indirect_object = "employee".to_string();
        let summary = compiler.compile(&[record], &mut store).unwrap();

        assert_eq!(summary.passive_relations, 1);
        assert!(
            compiler
                .relations()
                .get_by_name("must_be_provided_to")
                .is_some()
        );
    }

    #[test]
    fn missing_object_skips_relation_with_count() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        // Direct object canonicalizes to nothing, so no concept exists.
        let summary = compiler
            .compile(&[regulative("1", "Employer", "must", "provide", "the")], &mut store)
            .unwrap();
        assert_eq!(summary.forward_relations, 0);
        assert_eq!(summary.skipped_relations, 1);
    }

    #[test]
    fn observation_aim_relations_are_shared() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        let mut a = regulative("1", "Employer", "", "employs", "worker");
        a.function = StatementRole::Observation;
        let mut b = regulative("2", "Agency", "", "employs", "contractor");
        b.function = StatementRole::Observation;
        let summary = compiler.compile(&[a, b], &mut store).unwrap();

        assert_eq!(summary.forward_relations, 2);
        // One shared physical relation, two provenance comments.
        let id = compiler.relations().get_by_name("employs").unwrap();
        assert_eq!(compiler.relations().relation(id).unwrap().comments.len(), 2);
        assert!(compiler.relations().get_by_name("employs'").is_none());
    }

    #[test]
    fn constitutive_statement_builds_hierarchy_and_relation() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        let record = StatementRecord {
            statement_no: StatementId::new("3"),
            syntax: IgSyntax::Constitutive,
            function: StatementRole::Constitutive,
            constituted_entity: "paid sick time".to_string(),
            modal: "shall".to_string(),
            function_verb: "include".to_string(),
            constituted_properties: "compensation".to_string(),
            ..Default::default()
        };
        compiler.compile(&[record], &mut store).unwrap();

        assert!(compiler.concepts().get("paid sick time").is_some());
        assert!(compiler.concepts().get("compensation").is_some());
        assert!(compiler.relations().get_by_name("shall_include").is_some());
    }

    #[test]
    fn activation_condition_synthesizes_rule_into_store() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        let activation = regulative("1", "Employer", "must", "provide", "paid sick leave");
        let mut governed = regulative("2", "Employer", "", "Violates", "law");
        governed.activation_condition_ref = "1".to_string();
        let summary = compiler.compile(&[activation, governed], &mut store).unwrap();

        assert_eq!(summary.rules, 1);
        assert_eq!(store.export().rules.len(), 1);
        assert!(store.export().rules[0].rendered.contains("must_provide(?y, ?z)"));
    }

    #[test]
    fn store_receives_concepts_and_relations() {
        let compiler = Compiler::new(CompileOptions::default()).unwrap();
        let mut store = JsonOntologyStore::new();
        compiler
            .compile(
                &[regulative("1", "Employer", "must", "provide", "leave")],
                &mut store,
            )
            .unwrap();
        let export = store.export();
        assert!(!export.concepts.is_empty());
        assert!(!export.relations.is_empty());
    }
}
