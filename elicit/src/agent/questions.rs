//! Autonomous agent that generates its own questions.
//!
//! Each round composes a generation request, parses the loosely formatted
//! response into discrete candidates, and (when more than one candidate was
//! requested) asks an evaluator pass to pick the most informative one.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::agent::{ActiveLearningAgent, AgentCore};
use crate::error::{ElicitError, Result};
use crate::llm::QueryService;
use crate::metrics::ScoreRecord;
use crate::prompt;
use crate::scoring::TestResponse;
use crate::session::InteractionSession;
use crate::types::{ProblemInstance, QuestionType};

/// Leading enumeration artifacts: dashes, digits, periods, closing parens,
/// and the whitespace around them.
static ENUMERATION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-\d.)\s]*").unwrap());

/// Remove a leading enumeration marker and surrounding whitespace.
pub fn strip_enumeration(line: &str) -> String {
    ENUMERATION_PREFIX.replace(line, "").trim().to_string()
}

/// Strip one layer of wrapping quote characters.
fn strip_wrapping_quotes(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Extract discrete candidate questions from a raw generation response.
///
/// With one requested candidate the first line of the trimmed response is
/// the candidate (minus any enumeration marker). With several, each
/// non-blank line becomes a candidate after markers and wrapping quotes are
/// stripped; lines that strip to nothing are dropped. If nothing survives
/// despite non-empty raw text, the trimmed raw text is returned as a single
/// fallback candidate.
pub fn parse_candidates(raw: &str, requested: usize) -> Vec<String> {
    if requested <= 1 {
        let trimmed = raw.trim();
        let first_line = trimmed.lines().next().unwrap_or("");
        let candidate = strip_enumeration(first_line);
        if !candidate.is_empty() {
            return vec![candidate];
        }
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![trimmed.to_string()];
    }

    let candidates: Vec<String> = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| strip_wrapping_quotes(&strip_enumeration(line)).to_string())
        .filter(|candidate| !candidate.is_empty())
        .collect();

    if candidates.is_empty() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        warn!(target: "elicit::parse", "no candidates parsed, falling back to raw text");
        return vec![trimmed.to_string()];
    }
    candidates
}

/// Normalize the evaluator's echoed choice: first line of the trimmed
/// response, minus enumeration marker and one quote layer. The echo is
/// trusted as-is beyond that; it is not checked against the candidate list.
fn postprocess_choice(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("");
    strip_wrapping_quotes(&strip_enumeration(first_line)).to_string()
}

/// Active learning agent that generates questions to identify the target.
pub struct GenerativeQuestionsAgent {
    core: AgentCore,
    question_type: QuestionType,
    implementation: String,
    num_candidate_questions: usize,
}

impl std::fmt::Debug for GenerativeQuestionsAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeQuestionsAgent")
            .field("question_type", &self.question_type)
            .field("implementation", &self.implementation)
            .field("num_candidate_questions", &self.num_candidate_questions)
            .finish()
    }
}

impl GenerativeQuestionsAgent {
    /// Build the agent, rejecting an invalid question-type tag immediately.
    pub fn new(
        instance: ProblemInstance,
        service: QueryService,
        temperature: f64,
        question_type: &str,
        implementation: impl Into<String>,
        num_candidate_questions: usize,
    ) -> Result<Self> {
        let question_type = question_type.parse::<QuestionType>()?;
        Ok(Self {
            core: AgentCore::new(instance, service, temperature),
            question_type,
            implementation: implementation.into(),
            num_candidate_questions: num_candidate_questions.max(1),
        })
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    /// Ask the evaluator to pick the most informative candidate. Falls back
    /// to the first candidate when the echo normalizes to nothing.
    async fn select_best(&mut self, candidates: Vec<String>) -> Result<String> {
        let messages = prompt::choose_prompt(
            &self.core.task_description,
            &self.core.session,
            &candidates,
        );
        let temperature = self.core.temperature;
        let raw = self.core.service_mut().query(&messages, temperature).await?;

        let best = postprocess_choice(&raw);
        if best.is_empty() {
            warn!(target: "elicit::select", "evaluator returned nothing usable, taking first candidate");
            return candidates.into_iter().next().ok_or_else(|| {
                ElicitError::Provider("no candidates to select from".to_string())
            });
        }
        Ok(best)
    }
}

#[async_trait]
impl ActiveLearningAgent for GenerativeQuestionsAgent {
    async fn generate_active_query(&mut self) -> Result<Option<String>> {
        let messages = prompt::question_prompt(
            &self.core.task_description,
            self.question_type.as_str(),
            &self.implementation,
            &self.core.session,
            self.num_candidate_questions,
        )?;
        let temperature = self.core.temperature;
        let raw = self.core.service_mut().query(&messages, temperature).await?;

        let mut candidates = parse_candidates(&raw, self.num_candidate_questions);
        if candidates.is_empty() {
            return Err(ElicitError::Provider(
                "generation returned no usable candidates".to_string(),
            ));
        }

        let question = if candidates.len() == 1 {
            candidates.remove(0)
        } else {
            info!(
                target: "elicit::select",
                count = candidates.len(),
                "selecting best candidate"
            );
            self.select_best(candidates).await?
        };
        Ok(Some(question))
    }

    async fn generate_oracle_response(&mut self, query: &str) -> Result<String> {
        self.core.query_oracle(query, Some(self.question_type)).await
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
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::llm::StubProvider;
    use crate::types::TestCase;

    fn instance() -> ProblemInstance {
        ProblemInstance {
            task_description: "match all valid email addresses".to_string(),
            persona: "a meticulous mail administrator".to_string(),
            gold_regex: None,
            test_cases: vec![TestCase {
                input: "alice@example.com".to_string(),
                matches: true,
            }],
        }
    }

    #[test]
    fn single_candidate_strips_each_marker_style() {
        for raw in [
            "12) Does it allow uppercase?",
            "- Does it allow uppercase?",
            "3. Does it allow uppercase?",
            "Does it allow uppercase?",
        ] {
            let parsed = parse_candidates(raw, 1);
            assert_eq!(parsed, vec!["Does it allow uppercase?".to_string()], "raw: {raw}");
            assert!(!parsed[0].contains('\n'));
        }
    }

    #[test]
    fn single_candidate_takes_only_the_first_line() {
        let parsed = parse_candidates("1. First question?\nSecond line is noise", 1);
        assert_eq!(parsed, vec!["First question?".to_string()]);
    }

    #[test]
    fn multi_candidate_handles_mixed_numbering() {
        let raw = "1. Does it allow uppercase?\n2) What about numbers?\n- Any length limit?";
        let parsed = parse_candidates(raw, 3);
        assert_eq!(
            parsed,
            vec![
                "Does it allow uppercase?".to_string(),
                "What about numbers?".to_string(),
                "Any length limit?".to_string(),
            ]
        );
    }

    #[test]
    fn multi_candidate_strips_wrapping_quotes() {
        let raw = "1. \"Does it allow uppercase?\"\n2. 'What about numbers?'";
        let parsed = parse_candidates(raw, 2);
        assert_eq!(
            parsed,
            vec![
                "Does it allow uppercase?".to_string(),
                "What about numbers?".to_string(),
            ]
        );
    }

    #[test]
    fn multi_candidate_drops_blank_and_empty_lines() {
        let raw = "1. Real question?\n\n2.\n   \n3. Another one?";
        let parsed = parse_candidates(raw, 3);
        assert_eq!(
            parsed,
            vec!["Real question?".to_string(), "Another one?".to_string()]
        );
    }

    #[test]
    fn unformatted_paragraph_falls_back_to_raw_text() {
        let raw = "I would suggest asking about whether uppercase letters are permitted.";
        let parsed = parse_candidates(raw, 3);
        assert_eq!(parsed, vec![raw.to_string()]);
    }

    #[test]
    fn empty_response_yields_no_candidates() {
        assert!(parse_candidates("", 1).is_empty());
        assert!(parse_candidates("   \n  ", 3).is_empty());
    }

    #[test]
    fn single_candidate_that_strips_to_nothing_falls_back_to_raw_text() {
        let parsed = parse_candidates("-- \nActual question on the next line?", 1);
        assert_eq!(
            parsed,
            vec!["-- \nActual question on the next line?".to_string()]
        );
    }

    #[test]
    fn choice_postprocess_unwraps_quotes_and_first_line() {
        assert_eq!(
            postprocess_choice("\"Does it allow uppercase?\"\nBecause it is informative."),
            "Does it allow uppercase?"
        );
        assert_eq!(postprocess_choice("2. What about numbers?"), "What about numbers?");
    }

    #[test]
    fn invalid_question_type_is_rejected_at_construction() {
        let service = QueryService::stubbed(StubProvider::new(Default::default()));
        let err = GenerativeQuestionsAgent::new(instance(), service, 0.0, "essay", "regex", 1)
            .unwrap_err();
        assert!(matches!(err, ElicitError::InvalidQuestionType(_)));
    }

    #[tokio::test]
    async fn single_candidate_request_skips_the_selector() {
        let service = QueryService::stubbed(StubProvider::with_responses(vec![
            "1. Does it allow uppercase?".to_string(),
        ]));
        let mut agent =
            GenerativeQuestionsAgent::new(instance(), service, 0.0, "open", "regex", 1).unwrap();

        let question = agent.generate_active_query().await.unwrap();
        assert_eq!(question, Some("Does it allow uppercase?".to_string()));
    }

    #[tokio::test]
    async fn multi_candidate_request_runs_the_selector() {
        let service = QueryService::stubbed(StubProvider::with_responses(vec![
            "1. Does it allow uppercase?\n2) What about numbers?\n- Any length limit?".to_string(),
            "What about numbers?".to_string(),
        ]));
        let mut agent =
            GenerativeQuestionsAgent::new(instance(), service, 0.0, "open", "regex", 3).unwrap();

        let question = agent.generate_active_query().await.unwrap();
        assert_eq!(question, Some("What about numbers?".to_string()));
    }

    #[tokio::test]
    async fn degenerate_selector_echo_falls_back_to_first_candidate() {
        let service = QueryService::stubbed(StubProvider::with_responses(vec![
            "1. First?\n2. Second?".to_string(),
            "\"\"".to_string(),
        ]));
        let mut agent =
            GenerativeQuestionsAgent::new(instance(), service, 0.0, "open", "regex", 2).unwrap();

        let question = agent.generate_active_query().await.unwrap();
        assert_eq!(question, Some("First?".to_string()));
    }

    #[tokio::test]
    async fn oracle_response_is_recorded_in_order() {
        let service = QueryService::stubbed(StubProvider::with_responses(vec![
            "No, it must allow subdomains.".to_string(),
        ]));
        let mut agent =
            GenerativeQuestionsAgent::new(instance(), service, 0.0, "open", "regex", 1).unwrap();

        let answer = agent
            .generate_oracle_response("Does it allow subdomains?")
            .await
            .unwrap();
        assert_eq!(answer, "No, it must allow subdomains.");
        assert_eq!(agent.session().len(), 1);
    }
}
