//! Hypothesis-driven test-case scoring.
//!
//! After each evaluated round the agent asks the model for a regex
//! hypothesis consistent with the interaction history. Attempts that fail
//! to compile accumulate on a broken list that is fed back as negative
//! context; the list is never pruned for the life of the session.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::llm::QueryService;
use crate::metrics::{with_relative, ScoreRecord};
use crate::prompt;
use crate::session::InteractionSession;
use crate::types::TestCase;

/// Default number of hypothesis attempts per evaluation point.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Per-test-case record persisted into the transcript dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResponse {
    pub input: String,
    pub expected: bool,
    pub predicted: bool,
}

/// Strip one layer of wrapping quote characters.
fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Generates and evaluates regex hypotheses against an instance's test cases.
pub struct HypothesisScorer {
    broken_attempts: Vec<String>,
    current: Option<Regex>,
    max_attempts: u32,
}

impl Default for HypothesisScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl HypothesisScorer {
    pub fn new() -> Self {
        Self {
            broken_attempts: Vec::new(),
            current: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Previously rejected hypotheses, in rejection order.
    pub fn broken_attempts(&self) -> &[String] {
        &self.broken_attempts
    }

    /// The latest successfully compiled hypothesis, if any.
    pub fn current_pattern(&self) -> Option<&str> {
        self.current.as_ref().map(Regex::as_str)
    }

    /// Ask for a fresh hypothesis consistent with the history and none of
    /// the broken attempts. Non-compiling attempts join the broken list and
    /// trigger a retry, up to the per-evaluation attempt budget. On total
    /// failure the previous hypothesis (if any) is kept.
    pub async fn refresh(
        &mut self,
        service: &mut QueryService,
        task_description: &str,
        session: &InteractionSession,
        temperature: f64,
    ) -> Result<()> {
        for attempt in 1..=self.max_attempts {
            let messages = prompt::hypothesis_prompt(task_description, session, &self.broken_attempts);
            let raw = service.query(&messages, temperature).await?;
            let candidate = strip_quotes(raw.trim().lines().next().unwrap_or("")).to_string();

            match Regex::new(&candidate) {
                Ok(regex) => {
                    debug!(target: "elicit::scoring", pattern = %candidate, "hypothesis compiled");
                    self.current = Some(regex);
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        target: "elicit::scoring",
                        pattern = %candidate,
                        attempt,
                        error = %e,
                        "hypothesis failed to compile"
                    );
                    self.broken_attempts.push(candidate);
                }
            }
        }
        Ok(())
    }

    /// Evaluate the current hypothesis on the test cases. Without any
    /// compiled hypothesis every case is predicted as a non-match.
    pub fn evaluate(
        &self,
        test_cases: &[TestCase],
        baseline: Option<&ScoreRecord>,
    ) -> (ScoreRecord, Vec<TestResponse>) {
        let responses: Vec<TestResponse> = test_cases
            .iter()
            .map(|case| {
                let predicted = self
                    .current
                    .as_ref()
                    .map(|regex| regex.is_match(&case.input))
                    .unwrap_or(false);
                TestResponse {
                    input: case.input.clone(),
                    expected: case.matches,
                    predicted,
                }
            })
            .collect();

        let total = responses.len();
        let correct = responses
            .iter()
            .filter(|r| r.predicted == r.expected)
            .count();
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };

        let mut record = ScoreRecord::new();
        record.insert("accuracy".to_string(), accuracy);
        // With a hard regex prediction the probability assigned to the
        // correct label is 0 or 1 per case.
        record.insert("correct_prob".to_string(), accuracy);

        let record = match baseline {
            Some(base) => with_relative(&record, base),
            None => record,
        };
        (record, responses)
    }
}
