//! # lexigraph
//!
//! A compiler from Institutional Grammar statement annotations to a concept
//! hierarchy, a provenance-carrying relation graph, and inference rules.
//!
//! ## Architecture
//!
//! - **Names** (`names`): canonical concept and relation naming
//! - **Ontology** (`ontology`): concept registry, relation registry, and the
//!   per-statement relation index
//! - **Conditions** (`condition`): activation-condition parsing (OR/AND/NOT)
//! - **Rules** (`rules`): condition-to-rule synthesis with subclass-aware
//!   variable aliasing
//! - **Pipeline** (`pipeline`): the batch compiler driving the passes
//! - **Store** (`store`): ontology emission behind the [`store::OntologyStore`]
//!   trait
//!
//! ## Library usage
//!
//! ```no_run
//! use lexigraph::pipeline::{CompileOptions, Compiler, load_records};
//! use lexigraph::store::JsonOntologyStore;
//!
//! let compiler = Compiler::new(CompileOptions::default()).unwrap();
//! let records = load_records("statements.json".as_ref()).unwrap();
//! let mut store = JsonOntologyStore::new();
//! let summary = compiler.compile(&records, &mut store).unwrap();
//! println!("{summary}");
//! ```

pub mod condition;
pub mod error;
pub mod inflect;
pub mod names;
pub mod ontology;
pub mod pipeline;
pub mod rules;
pub mod statement;
pub mod store;
