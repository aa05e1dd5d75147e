//! Interaction session: the append-only log of oracle exchanges.
//!
//! The session is the authoritative chronological context for every prompt
//! the agent composes. Entries are never removed or reordered.

use serde::{Deserialize, Serialize};

use crate::types::InteractionTurn;

/// Stand-in question shown when no interaction has happened yet.
pub const SEED_QUESTION: &str = "[Q]";
/// Stand-in answer paired with [`SEED_QUESTION`].
pub const SEED_ANSWER: &str = "[A]";

/// Ordered, append-only log of (question, answer) pairs for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSession {
    turns: Vec<InteractionTurn>,
    /// First number used when rendering the transcript.
    numbering_offset: usize,
}

impl Default for InteractionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionSession {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            numbering_offset: 1,
        }
    }

    pub fn with_numbering_offset(offset: usize) -> Self {
        Self {
            turns: Vec::new(),
            numbering_offset: offset,
        }
    }

    /// Record one completed exchange at the end of the log.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(InteractionTurn::new(question, answer));
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[InteractionTurn] {
        &self.turns
    }

    /// Total character length of all recorded questions and answers.
    pub fn total_char_length(&self) -> usize {
        self.turns
            .iter()
            .map(|t| t.question.chars().count() + t.answer.chars().count())
            .sum()
    }

    /// Render the numbered transcript consumed by prompt composition.
    ///
    /// An empty history renders the fixed `[Q]`/`[A]` stand-in pair so the
    /// very first generation prompt still demonstrates the expected format.
    /// The stand-in is not a recorded turn.
    pub fn render(&self) -> String {
        if self.turns.is_empty() {
            return format!("{}. {}\n{}", self.numbering_offset, SEED_QUESTION, SEED_ANSWER);
        }
        self.turns
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                format!(
                    "{}. {}\n{}",
                    i + self.numbering_offset,
                    turn.question,
                    turn.answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_session_renders_seed_pair() {
        let session = InteractionSession::new();
        assert_eq!(session.render(), "1. [Q]\n[A]");
    }

    #[test]
    fn render_preserves_order_and_content() {
        let mut session = InteractionSession::new();
        session.append("Does it allow uppercase?", "Yes.");
        session.append("Any length limit?", "No, any length is fine.");

        let rendered = session.render();
        assert_eq!(
            rendered,
            "1. Does it allow uppercase?\nYes.\n\n2. Any length limit?\nNo, any length is fine."
        );
    }

    #[test]
    fn render_contains_every_pair_exactly_once() {
        let mut session = InteractionSession::new();
        for i in 0..5 {
            session.append(format!("question {i}"), format!("answer {i}"));
        }
        let rendered = session.render();
        for i in 0..5 {
            assert_eq!(rendered.matches(&format!("question {i}")).count(), 1);
            assert_eq!(rendered.matches(&format!("answer {i}")).count(), 1);
        }
    }

    #[test]
    fn numbering_offset_shifts_the_transcript() {
        let mut session = InteractionSession::with_numbering_offset(3);
        session.append("q", "a");
        assert_eq!(session.render(), "3. q\na");
    }

    #[test]
    fn total_char_length_counts_questions_and_answers() {
        let mut session = InteractionSession::new();
        session.append("ab", "cde");
        assert_eq!(session.total_char_length(), 5);
    }
}
