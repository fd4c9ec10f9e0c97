//! Rich diagnostic error types for the lexigraph compiler.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so annotators know exactly which record
//! broke and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the lexigraph compiler.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum LexiError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Concept(#[from] ConceptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Relation(#[from] RelationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipeline(#[from] PipelineError),
}

// ---------------------------------------------------------------------------
// Concept registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConceptError {
    #[error("superclass of '{name}' is missing")]
    #[diagnostic(
        code(lexi::concept::missing_superclass),
        help(
            "A concept can never be created without a resolvable parent. \
             Check the annotation row: the superclass column is empty or \
             canonicalizes to nothing."
        )
    )]
    MissingSuperclass { name: String },

    #[error("concept id allocator exhausted")]
    #[diagnostic(
        code(lexi::concept::exhausted),
        help(
            "The concept ID space is exhausted. This requires 2^64 allocations \
             and indicates an allocation loop, not a real workload."
        )
    )]
    AllocatorExhausted,
}

// ---------------------------------------------------------------------------
// Relation registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RelationError {
    #[error("collision resolution for relation '{label}' gave up after {attempts} attempts")]
    #[diagnostic(
        code(lexi::relation::collision_cap),
        help(
            "More than the allowed number of distinct domains share this relation \
             label. Raise `collision_cap` in CompileOptions, or review the source \
             annotation for a label that should be a shared relation."
        )
    )]
    CollisionCapExceeded { label: String, attempts: usize },

    #[error("relation id allocator exhausted")]
    #[diagnostic(
        code(lexi::relation::exhausted),
        help("The relation ID space is exhausted. Check for an allocation loop.")
    )]
    AllocatorExhausted,
}

// ---------------------------------------------------------------------------
// Ontology store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(lexi::store::io),
        help(
            "A filesystem operation failed. Check that the output directory \
             exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(lexi::store::serde),
        help("Failed to serialize the ontology for saving. This is a bug; please report it.")
    )]
    Serialization { message: String },

    #[error("unknown concept reference: {id}")]
    #[diagnostic(
        code(lexi::store::unknown_concept),
        help(
            "The store was handed a concept reference it never created. \
             Concepts must be registered via `create_concept` before they \
             appear in a relation or rule."
        )
    )]
    UnknownConcept { id: u64 },
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("invalid compile options: {message}")]
    #[diagnostic(
        code(lexi::pipeline::invalid_options),
        help("Check the CompileOptions fields. {message}")
    )]
    InvalidOptions { message: String },

    #[error("failed to parse options file {path}: {message}")]
    #[diagnostic(
        code(lexi::pipeline::options_parse),
        help("The options file must be valid TOML with the CompileOptions fields.")
    )]
    OptionsParse { path: String, message: String },

    #[error("failed to read statement records from {path}: {message}")]
    #[diagnostic(
        code(lexi::pipeline::records_read),
        help(
            "Statement records must be a JSON array of normalized rows as \
             produced by the tabular ingestion step."
        )
    )]
    RecordsRead { path: String, message: String },
}

/// Convenience alias for functions returning lexigraph results.
pub type LexiResult<T> = std::result::Result<T, LexiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_error_converts_to_lexi_error() {
        let err = ConceptError::MissingSuperclass {
            name: "Employer".into(),
        };
        let lexi: LexiError = err.into();
        assert!(matches!(
            lexi,
            LexiError::Concept(ConceptError::MissingSuperclass { .. })
        ));
    }

    #[test]
    fn relation_error_converts_to_lexi_error() {
        let err = RelationError::CollisionCapExceeded {
            label: "must_provide".into(),
            attempts: 64,
        };
        let lexi: LexiError = err.into();
        assert!(matches!(
            lexi,
            LexiError::Relation(RelationError::CollisionCapExceeded { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = RelationError::CollisionCapExceeded {
            label: "must_provide".into(),
            attempts: 64,
        };
        let msg = format!("{err}");
        assert!(msg.contains("must_provide"));
        assert!(msg.contains("64"));
    }
}
