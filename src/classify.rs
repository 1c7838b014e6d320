use std::collections::HashSet;
use std::sync::OnceLock;

use crate::data_models::Classification;

// Built once; checked for every suggestion that comes through.
static QUESTION_STARTERS: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn get_question_starters() -> &'static HashSet<&'static str> {
    QUESTION_STARTERS.get_or_init(|| {
        HashSet::from([
            "what", "how", "why", "when", "where", "which", "who", "can", "is", "do", "does",
            "will", "should", "are",
        ])
    })
}

/// True when `word` is one of the fixed question-starter words.
pub fn is_question_starter(word: &str) -> bool {
    get_question_starters().contains(word.trim().to_lowercase().as_str())
}

/// Lexical question test: the lowercased, trimmed string starts with a
/// question-starter word followed by a space, or contains a literal `?`.
pub fn is_question(suggestion: &str) -> bool {
    let normalized = suggestion.trim().to_lowercase();
    if normalized.contains('?') {
        return true;
    }
    match normalized.split_once(' ') {
        Some((first, _)) => get_question_starters().contains(first),
        None => false,
    }
}

/// Collapses the concatenated lookup results into a list where each distinct
/// string (exact match, case-sensitive) appears once, first-seen order.
pub fn dedupe(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for suggestion in raw {
        if seen.insert(suggestion.clone()) {
            unique.push(suggestion);
        }
    }
    unique
}

/// Partitions a deduplicated suggestion list. Every input lands in exactly
/// one side; anything that is not a question is organic.
pub fn classify(suggestions: Vec<String>) -> Classification {
    let mut classification = Classification::default();
    for suggestion in suggestions {
        if is_question(&suggestion) {
            classification.questions.push(suggestion);
        } else {
            classification.organic.push(suggestion);
        }
    }
    classification
}
