//! The elicitation loop.
//!
//! Drives repeated rounds of query generation, oracle response, and metric
//! updates against a single agent until the round budget is exhausted or a
//! human sends a stop word.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::ActiveLearningAgent;
use crate::error::{ElicitError, Result};
use crate::metrics::{update_metrics, MetricsAccumulator};
use crate::scoring::TestResponse;
use crate::transcript::TranscriptWriter;

/// Sentinel inputs that end a human-driven session cleanly.
pub const STOP_WORDS: [&str; 3] = ["quit", "exit", "stop"];

/// True when a human input line is a session-terminating sentinel.
pub fn is_stop_word(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    STOP_WORDS.contains(&normalized.as_str())
}

/// When metric recomputation happens during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvalCondition {
    /// After every completed round (the default).
    #[default]
    PerTurn,
    /// Only after the final round.
    AtEnd,
}

impl EvalCondition {
    fn should_eval(&self, round: usize, total_rounds: usize) -> bool {
        match self {
            EvalCondition::PerTurn => true,
            EvalCondition::AtEnd => round + 1 == total_rounds,
        }
    }
}

/// Source of human queries for the interactive variant.
pub trait QueryInput {
    fn next_query(&mut self) -> Result<String>;
}

/// Serves queries from a fixed list; used by tests and scripted runs.
pub struct ScriptedInput {
    queries: std::collections::VecDeque<String>,
}

impl ScriptedInput {
    pub fn new(queries: Vec<String>) -> Self {
        Self {
            queries: queries.into(),
        }
    }
}

impl QueryInput for ScriptedInput {
    fn next_query(&mut self) -> Result<String> {
        self.queries
            .pop_front()
            .ok_or_else(|| ElicitError::Input("no more scripted queries".to_string()))
    }
}

/// Loop configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub num_rounds: usize,
    pub eval_condition: EvalCondition,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            num_rounds: 5,
            eval_condition: EvalCondition::PerTurn,
        }
    }
}

/// Everything a completed session leaves behind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Interaction features per evaluation point, round 0 included.
    pub features: MetricsAccumulator,
    /// Test-case scores per evaluation point, round 0 included.
    pub scores: MetricsAccumulator,
    /// Raw test responses per evaluation point.
    pub test_responses: Vec<Vec<TestResponse>>,
    /// Completed rounds (excluding the round-0 baseline).
    pub completed_rounds: usize,
}

/// Run one elicitation session.
///
/// The agent supplies queries itself, or - when it yields `None` - they are
/// pulled from `input`; a stop word there ends the session before any new
/// metrics round is appended. The round-0 baseline is captured before the
/// first interaction.
pub async fn run_session(
    agent: &mut dyn ActiveLearningAgent,
    config: &LoopConfig,
    mut input: Option<&mut dyn QueryInput>,
    mut transcript: Option<&mut TranscriptWriter>,
) -> Result<SessionOutcome> {
    if let Some(t) = transcript.as_deref_mut() {
        t.persona_header(agent.persona())?;
    }

    let features = agent.get_interaction_features();
    let (baseline, responses) = agent.score_test_cases(None).await?;
    info!(
        target: "elicit::loop",
        accuracy = baseline.get("accuracy").copied().unwrap_or(0.0),
        "round 0 baseline"
    );

    let mut all_features = update_metrics(MetricsAccumulator::new(), &features);
    let mut all_scores = update_metrics(MetricsAccumulator::new(), &baseline);
    let mut all_responses = vec![responses];
    let mut completed_rounds = 0;

    for round in 0..config.num_rounds {
        let query = match agent.generate_active_query().await? {
            Some(query) => query,
            None => {
                let Some(source) = input.as_deref_mut() else {
                    break;
                };
                let line = source.next_query()?;
                if is_stop_word(&line) {
                    info!(target: "elicit::loop", round, "stop word received, ending session");
                    break;
                }
                line.trim().to_string()
            }
        };

        let answer = agent.generate_oracle_response(&query).await?;
        info!(target: "elicit::loop", round, %query, "oracle answered");

        if let Some(t) = transcript.as_deref_mut() {
            t.round(round, &query, &answer)?;
        }
        completed_rounds += 1;

        if !config.eval_condition.should_eval(round, config.num_rounds) {
            continue;
        }
        if let Some(t) = transcript.as_deref_mut() {
            t.eval_point()?;
        }

        let features = agent.get_interaction_features();
        let (scores, responses) = agent.score_test_cases(Some(&baseline)).await?;
        info!(
            target: "elicit::loop",
            round,
            accuracy = scores.get("accuracy").copied().unwrap_or(0.0),
            "round scored"
        );

        all_features = update_metrics(all_features, &features);
        all_scores = update_metrics(all_scores, &scores);
        all_responses.push(responses);
    }

    if let Some(t) = transcript.as_deref_mut() {
        t.test_responses(&all_responses)?;
    }

    Ok(SessionOutcome {
        features: all_features,
        scores: all_scores,
        test_responses: all_responses,
        completed_rounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_words_match_case_insensitively() {
        for word in ["quit", "QUIT", "Exit", " stop ", "sToP"] {
            assert!(is_stop_word(word), "{word}");
        }
        assert!(!is_stop_word("quite"));
        assert!(!is_stop_word("stop now"));
    }

    #[test]
    fn per_turn_evaluates_every_round() {
        assert!(EvalCondition::PerTurn.should_eval(0, 5));
        assert!(EvalCondition::PerTurn.should_eval(4, 5));
    }

    #[test]
    fn at_end_evaluates_only_the_last_round() {
        assert!(!EvalCondition::AtEnd.should_eval(0, 5));
        assert!(!EvalCondition::AtEnd.should_eval(3, 5));
        assert!(EvalCondition::AtEnd.should_eval(4, 5));
    }

    #[test]
    fn scripted_input_serves_in_order_then_errors() {
        let mut input = ScriptedInput::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(input.next_query().unwrap(), "a");
        assert_eq!(input.next_query().unwrap(), "b");
        assert!(input.next_query().is_err());
    }
}
