//! English verb inflection for passive-voice relation naming.
//!
//! Rule-based, not a full morphology engine: an irregular-verb table plus
//! regular suffix rules, enough to turn annotation aim verbs ("provide",
//! "pay") into the participles used in passive relation labels. The
//! [`Inflector`] trait is the seam for swapping in a richer service; every
//! implementation must be a pure function returning one canonical form per
//! verb.

/// Deterministic verb → passive participle service.
pub trait Inflector {
    fn passive_participle(&self, verb: &str) -> String;
}

/// Built-in rule-based English inflector.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishInflector;

impl Inflector for EnglishInflector {
    fn passive_participle(&self, verb: &str) -> String {
        let verb = verb.trim().to_lowercase();
        if let Some(irregular) = irregular_participle(&verb) {
            return irregular.to_string();
        }

        // Regular formation: -e → -ed, consonant+y → -ied, else +ed.
        if verb.ends_with('e') {
            return format!("{verb}d");
        }
        if let Some(stem) = verb.strip_suffix('y') {
            let penultimate = stem.chars().next_back();
            if penultimate.is_some_and(|c| !"aeiou".contains(c)) {
                return format!("{stem}ied");
            }
        }
        format!("{verb}ed")
    }
}

fn irregular_participle(verb: &str) -> Option<&'static str> {
    let participle = match verb {
        "be" => "been",
        "bear" => "borne",
        "bring" => "brought",
        "buy" => "bought",
        "choose" => "chosen",
        "do" => "done",
        "find" => "found",
        "forbid" => "forbidden",
        "give" => "given",
        "hold" => "held",
        "keep" => "kept",
        "know" => "known",
        "lay" => "laid",
        "leave" => "left",
        "lend" => "lent",
        "lose" => "lost",
        "make" => "made",
        "meet" => "met",
        "pay" => "paid",
        "put" => "put",
        "read" => "read",
        "see" => "seen",
        "sell" => "sold",
        "send" => "sent",
        "set" => "set",
        "show" => "shown",
        "take" => "taken",
        "teach" => "taught",
        "tell" => "told",
        "think" => "thought",
        "understand" => "understood",
        "withhold" => "withheld",
        "write" => "written",
        _ => return None,
    };
    Some(participle)
}

/// Passive relation phrase for a deontic regulative statement:
/// `"<deontic> be <participle(aim)> to"`.
pub fn passive_deontic_label(deontic: &str, aim: &str, inflector: &dyn Inflector) -> String {
    format!("{deontic} be {} to", inflector.passive_participle(aim))
}

/// Passive relation phrase for an observation: `"is <participle(aim)>"`.
pub fn passive_label(aim: &str, inflector: &dyn Inflector) -> String {
    format!("is {}", inflector.passive_participle(aim))
}
