//! Name canonicalization: raw annotation text to symbol-safe identifiers.
//!
//! Annotation cells arrive as free text with IG connector markers
//! (`and[each,`, `and[any`), stray brackets, and inconsistent casing. Concept
//! names are reduced to a TitleCase identifier; relation labels only have
//! their whitespace collapsed so they stay usable as predicate identifiers.

/// Canonicalize a free-text label into a concept identifier.
///
/// Lowercases, turns hyphens into spaces, strips the IG connector markers and
/// literal bracket/pipe characters, drops the standalone article "the", then
/// joins the remaining words in title case with no separator.
///
/// Returns `None` when nothing survives the stripping; callers must treat
/// that as "no symbol", not as an error.
pub fn concept_name(raw: &str) -> Option<String> {
    let lowered = raw
        .to_lowercase()
        .replace('-', " ")
        .replace("and[each,", "")
        .replace("and[any", "")
        .replace(['|', '[', ']'], "");

    let name: String = lowered
        .split_whitespace()
        .filter(|word| *word != "the")
        .map(title_word)
        .collect();

    if name.is_empty() { None } else { Some(name) }
}

/// Canonicalize a relation phrase into a predicate identifier.
///
/// Only whitespace runs are collapsed to a single `_`; casing is preserved so
/// the label stays a stable predicate name. May return an empty string for
/// blank input.
pub fn relation_label(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_name_title_cases_words() {
        assert_eq!(concept_name("paid sick leave").as_deref(), Some("PaidSickLeave"));
        assert_eq!(concept_name("Employer").as_deref(), Some("Employer"));
    }

    #[test]
    fn concept_name_strips_article_and_hyphens() {
        assert_eq!(concept_name("the full-time employee").as_deref(), Some("FullTimeEmployee"));
    }

    #[test]
    fn concept_name_strips_connector_markers() {
        assert_eq!(
            concept_name("and[each, employer | agency]").as_deref(),
            Some("EmployerAgency")
        );
        assert_eq!(concept_name("and[any employee]").as_deref(), Some("Employee"));
    }

    #[test]
    fn concept_name_empty_after_stripping_is_none() {
        assert_eq!(concept_name(""), None);
        assert_eq!(concept_name("the"), None);
        assert_eq!(concept_name("[|]"), None);
    }

    #[test]
    fn relation_label_collapses_whitespace_only() {
        assert_eq!(relation_label("must  be provided to"), "must_be_provided_to");
        assert_eq!(relation_label("Violates"), "Violates");
        assert_eq!(relation_label("  "), "");
    }

    #[test]
    fn relation_label_preserves_case() {
        assert_eq!(relation_label("Must Provide"), "Must_Provide");
    }
}
