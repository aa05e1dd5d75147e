//! Active-learning agents.
//!
//! Both variants (autonomous question generation and human-driven input)
//! implement one capability trait and are selected at session construction;
//! the elicitation loop never inspects which variant it is driving.

pub mod core;
pub mod interactive;
pub mod questions;

pub use self::core::AgentCore;
pub use self::interactive::InteractiveUserAgent;
pub use self::questions::GenerativeQuestionsAgent;

use async_trait::async_trait;

use crate::error::Result;
use crate::metrics::ScoreRecord;
use crate::scoring::TestResponse;
use crate::session::InteractionSession;

/// Capability interface shared by the elicitation loop's agent variants.
#[async_trait]
pub trait ActiveLearningAgent: Send {
    /// Produce the next question to ask the oracle, or `None` when queries
    /// are supplied externally (human-driven variant).
    async fn generate_active_query(&mut self) -> Result<Option<String>>;

    /// Ask the oracle and record the (question, answer) pair.
    async fn generate_oracle_response(&mut self, query: &str) -> Result<String>;

    /// Refresh the hypothesis and score it on the held-out test cases.
    /// With a baseline, the record additionally carries `*_relative` deltas.
    async fn score_test_cases(
        &mut self,
        baseline: Option<&ScoreRecord>,
    ) -> Result<(ScoreRecord, Vec<TestResponse>)>;

    /// Cheap descriptive features of the interaction so far.
    fn get_interaction_features(&self) -> ScoreRecord;

    /// The oracle persona for this session.
    fn persona(&self) -> &str;

    /// The recorded interaction history.
    fn session(&self) -> &InteractionSession;
}
