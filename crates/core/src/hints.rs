//! Maps a free-text "next best move" hint to the school it points at.
//!
//! The vocabulary is ad hoc: phrasings outside these rules fall through to
//! the progress label.

use crate::{RunProgress, RunProgressLabel, School};

pub trait HintParser {
    fn school_for_hint(&self, hint: &str) -> Option<School>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintPattern {
    /// `[TAG] ...` at the very start of the hint, case-insensitive.
    BracketTag(&'static str),
    /// `<prefix> WORD ...` where the whole leading word equals `word`.
    LeadingWord {
        prefix: &'static str,
        word: &'static str,
    },
}

impl HintPattern {
    pub fn matches(&self, hint: &str) -> bool {
        match *self {
            Self::BracketTag(tag) => {
                bracket_tag(hint).is_some_and(|found| found.eq_ignore_ascii_case(tag))
            }
            Self::LeadingWord { prefix, word } => {
                leading_word(hint, prefix).is_some_and(|found| found.eq_ignore_ascii_case(word))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintRule {
    pub pattern: HintPattern,
    pub school: School,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRules {
    rules: Vec<HintRule>,
}

const NEXT_MOVE_PREFIX: &str = "Next move:";

const BRACKET_TAGS: [(&str, School); 6] = [
    ("FI", School::Introduction),
    ("FU", School::Understanding),
    ("FPR", School::Presentation),
    ("FA", School::Abstraction),
    ("FS", School::Synthesis),
    ("ENRICH", School::Planning),
];

const INTENT_WORDS: [(&str, School); 7] = [
    ("INTRODUCE", School::Introduction),
    ("UNDERSTAND", School::Understanding),
    ("PRESENT", School::Presentation),
    ("ABSTRACT", School::Abstraction),
    ("SYNTHESIZE", School::Synthesis),
    ("PATCH", School::Introduction),
    ("ENRICH", School::Planning),
];

impl HintRules {
    pub fn new(rules: Vec<HintRule>) -> Self {
        Self { rules }
    }

    /// Bracket tags first, then `Next move: INTENT` words.
    pub fn standard() -> Self {
        let tags = BRACKET_TAGS.iter().map(|&(tag, school)| HintRule {
            pattern: HintPattern::BracketTag(tag),
            school,
        });
        let intents = INTENT_WORDS.iter().map(|&(word, school)| HintRule {
            pattern: HintPattern::LeadingWord {
                prefix: NEXT_MOVE_PREFIX,
                word,
            },
            school,
        });
        Self::new(tags.chain(intents).collect())
    }

    pub fn rules(&self) -> &[HintRule] {
        &self.rules
    }
}

impl Default for HintRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl HintParser for HintRules {
    fn school_for_hint(&self, hint: &str) -> Option<School> {
        let hint = hint.trim();
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(hint))
            .map(|rule| rule.school)
    }
}

pub fn school_for_label(label: RunProgressLabel) -> Option<School> {
    match label {
        RunProgressLabel::Drift | RunProgressLabel::Stalled => Some(School::Understanding),
        RunProgressLabel::Partial => Some(School::Presentation),
        RunProgressLabel::Advanced => None,
    }
}

pub fn school_for_progress<H: HintParser + ?Sized>(
    parser: &H,
    progress: Option<&RunProgress>,
) -> Option<School> {
    let progress = progress?;
    parser
        .school_for_hint(&progress.next_best_move_hint)
        .or_else(|| school_for_label(progress.progress_label))
}

fn bracket_tag(hint: &str) -> Option<&str> {
    let rest = hint.strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

fn leading_word<'a>(hint: &'a str, prefix: &str) -> Option<&'a str> {
    let head = hint.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = hint[prefix.len()..].trim_start();
    let end = rest
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}
