//! Human-driven agent: queries come from a person, answers from the oracle.

use async_trait::async_trait;

use crate::agent::{ActiveLearningAgent, AgentCore};
use crate::error::Result;
use crate::llm::QueryService;
use crate::metrics::ScoreRecord;
use crate::scoring::TestResponse;
use crate::session::InteractionSession;
use crate::types::ProblemInstance;

/// Active learning agent that takes queries from a human user.
pub struct InteractiveUserAgent {
    core: AgentCore,
}

impl InteractiveUserAgent {
    pub fn new(instance: ProblemInstance, service: QueryService, temperature: f64) -> Self {
        Self {
            core: AgentCore::new(instance, service, temperature),
        }
    }
}

#[async_trait]
impl ActiveLearningAgent for InteractiveUserAgent {
    /// Queries are provided externally; the loop reads them from its input
    /// source when this returns `None`.
    async fn generate_active_query(&mut self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn generate_oracle_response(&mut self, query: &str) -> Result<String> {
        self.core.query_oracle(query, None).await
    }

    async fn score_test_cases(
        &mut self,
        baseline: Option<&ScoreRecord>,
    ) -> Result<(ScoreRecord, Vec<TestResponse>)> {
        self.core.score(baseline).await
    }

    fn get_interaction_features(&self) -> ScoreRecord {
        self.core.interaction_features()
    }

    fn persona(&self) -> &str {
        &self.core.persona
    }

    fn session(&self) -> &InteractionSession {
        &self.core.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubProvider;

    #[tokio::test]
    async fn interactive_agent_never_generates_queries() {
        let instance = ProblemInstance {
            task_description: "match x".to_string(),
            persona: "p".to_string(),
            gold_regex: None,
            test_cases: vec![],
        };
        let service = QueryService::stubbed(StubProvider::new(Default::default()));
        let mut agent = InteractiveUserAgent::new(instance, service, 0.0);
        assert_eq!(agent.generate_active_query().await.unwrap(), None);
    }
}
