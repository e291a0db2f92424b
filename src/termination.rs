//! Farewell-phrase termination predicate
//!
//! A conversation ends when the newest turn is a user turn whose text contains
//! one of the configured phrases. Matching is a case-insensitive substring
//! test, so "bye the way" also matches `bye`.

use crate::conversation::{Role, Turn};

/// Phrases used when none are configured
pub const DEFAULT_FAREWELL_PHRASES: &[&str] = &[
    "goodbye",
    "bye",
    "that's all",
    "thank you",
    "thanks, that's it",
    "nothing else",
    "exit",
    "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationEvaluator {
    phrases: Vec<String>,
}

impl TerminationEvaluator {
    /// Build an evaluator; phrases are lower-cased once and blanks dropped
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn should_terminate(&self, turns: &[Turn]) -> bool {
        self.is_farewell(turns.last())
    }

    pub fn is_farewell(&self, turn: Option<&Turn>) -> bool {
        self.matched_phrase(turn).is_some()
    }

    /// The first configured phrase found in the turn, if it is a user turn
    pub fn matched_phrase(&self, turn: Option<&Turn>) -> Option<&str> {
        let turn = turn.filter(|t| t.role == Role::User)?;
        let text = turn.text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| text.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

impl Default for TerminationEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_FAREWELL_PHRASES)
    }
}
