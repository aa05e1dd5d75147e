//! Core types shared across the elicitation pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ElicitError;

/// Kind of question the generative agent is allowed to ask the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Questions answerable with yes or no.
    Yn,
    /// Open-ended questions.
    Open,
}

impl QuestionType {
    /// Tag form used in config files and prompt composition.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Yn => "yn",
            QuestionType::Open => "open",
        }
    }

    /// Human phrasing inserted into generation prompts.
    pub fn describe(&self) -> &'static str {
        match self {
            QuestionType::Yn => "yes/no question",
            QuestionType::Open => "open-ended question",
        }
    }
}

impl FromStr for QuestionType {
    type Err = ElicitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yn" => Ok(QuestionType::Yn),
            "open" => Ok(QuestionType::Open),
            other => Err(ElicitError::InvalidQuestionType(other.to_string())),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded (question, answer) exchange with the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTurn {
    pub question: String,
    pub answer: String,
}

impl InteractionTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A single labeled example from a problem instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Candidate string presented to the target format.
    pub input: String,
    /// Whether the hidden target accepts the string.
    pub matches: bool,
}

/// A hidden-target problem instance: the task the agent must infer, the
/// persona answering for it, and held-out labeled test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemInstance {
    /// What the target format should do, e.g. "match all valid email addresses".
    pub task_description: String,
    /// Fixed textual description of the simulated oracle for this session.
    pub persona: String,
    /// The gold target, kept only for reference in the instance file.
    #[serde(default)]
    pub gold_regex: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl ProblemInstance {
    /// Load an instance from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// One role/content pair in a query-service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}
