//! State shared by both agent variants.

use std::time::Instant;

use crate::error::Result;
use crate::llm::QueryService;
use crate::metrics::ScoreRecord;
use crate::prompt;
use crate::scoring::{HypothesisScorer, TestResponse};
use crate::session::InteractionSession;
use crate::types::{ProblemInstance, QuestionType, TestCase};

/// Task context, interaction history, query service, and scorer for one
/// elicitation session. Owned exclusively by the active agent.
pub struct AgentCore {
    pub task_description: String,
    pub persona: String,
    pub temperature: f64,
    pub session: InteractionSession,
    test_cases: Vec<TestCase>,
    service: QueryService,
    scorer: HypothesisScorer,
    started: Instant,
}

impl AgentCore {
    pub fn new(instance: ProblemInstance, service: QueryService, temperature: f64) -> Self {
        Self {
            task_description: instance.task_description,
            persona: instance.persona,
            temperature,
            session: InteractionSession::new(),
            test_cases: instance.test_cases,
            service,
            scorer: HypothesisScorer::new(),
            started: Instant::now(),
        }
    }

    pub fn service_mut(&mut self) -> &mut QueryService {
        &mut self.service
    }

    /// Ask the oracle one question and append the exchange to the session.
    pub async fn query_oracle(
        &mut self,
        question: &str,
        question_type: Option<QuestionType>,
    ) -> Result<String> {
        let messages = prompt::oracle_prompt(&self.persona, question, question_type);
        let answer = self.service.query(&messages, self.temperature).await?;
        self.session.append(question, answer.clone());
        Ok(answer)
    }

    /// Descriptive features of the interaction so far.
    pub fn interaction_features(&self) -> ScoreRecord {
        let mut record = ScoreRecord::new();
        record.insert(
            "interaction_time".to_string(),
            self.started.elapsed().as_secs_f64(),
        );
        record.insert(
            "interaction_num_turns".to_string(),
            self.session.len() as f64,
        );
        record.insert(
            "interaction_total_char_length".to_string(),
            self.session.total_char_length() as f64,
        );
        record
    }

    /// Refresh the hypothesis from the current history and evaluate it.
    pub async fn score(
        &mut self,
        baseline: Option<&ScoreRecord>,
    ) -> Result<(ScoreRecord, Vec<TestResponse>)> {
        self.scorer
            .refresh(
                &mut self.service,
                &self.task_description,
                &self.session,
                self.temperature,
            )
            .await?;
        Ok(self.scorer.evaluate(&self.test_cases, baseline))
    }
}
