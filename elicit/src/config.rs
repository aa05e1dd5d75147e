//! Configuration types for elicitation sessions.
//!
//! Loaded from TOML; every field has a default so a partial file works.
//! API keys come from the environment, never from the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elicitation::EvalCondition;
use crate::error::{ElicitError, Result};
use crate::llm::{LlmProviderConfig, LlmProviderType};

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider type (openai, anthropic, stub).
    pub provider_type: LlmProviderType,
    /// Model name/identifier.
    pub model: String,
    /// Base URL for API (optional, for custom endpoints).
    pub base_url: Option<String>,
    /// Maximum tokens per completion.
    pub max_tokens: Option<u32>,
    /// Timeout in seconds.
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_type: LlmProviderType::Stub,
            model: "stub-model".to_string(),
            base_url: None,
            max_tokens: Some(1024),
            timeout_seconds: None,
        }
    }
}

impl LlmConfig {
    /// Environment variable holding the API key for this provider type.
    fn api_key_var(&self) -> Option<&'static str> {
        match self.provider_type {
            LlmProviderType::OpenAi => Some("OPENAI_API_KEY"),
            LlmProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmProviderType::Stub => None,
        }
    }

    /// Convert to a provider config, resolving the API key from the
    /// environment.
    pub fn to_provider_config(&self) -> LlmProviderConfig {
        let api_key = self.api_key_var().and_then(|var| std::env::var(var).ok());
        LlmProviderConfig {
            provider_type: self.provider_type.clone(),
            model: self.model.clone(),
            api_key,
            base_url: self.base_url.clone(),
            max_tokens: self.max_tokens,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Session-level knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of interaction rounds.
    pub num_rounds: usize,
    /// Question-type tag for the generative agent (yn, open).
    pub question_type: String,
    /// Candidate questions generated per round.
    pub num_candidate_questions: usize,
    /// Sampling temperature for every service call.
    pub temperature: f64,
    /// Implementation-domain label inserted into generation prompts.
    pub implementation: String,
    /// When metrics are recomputed.
    pub eval_condition: EvalCondition,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            num_rounds: 5,
            question_type: "open".to_string(),
            num_candidate_questions: 1,
            temperature: 0.0,
            implementation: "regex".to_string(),
            eval_condition: EvalCondition::PerTurn,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElicitConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ElicitConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| ElicitError::Config(format!("invalid config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stub_backed() {
        let config = ElicitConfig::default();
        assert_eq!(config.llm.provider_type, LlmProviderType::Stub);
        assert_eq!(config.session.num_rounds, 5);
        assert_eq!(config.session.question_type, "open");
        assert_eq!(config.session.eval_condition, EvalCondition::PerTurn);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ElicitConfig = toml::from_str(
            r#"
            [session]
            num_rounds = 3
            question_type = "yn"
            num_candidate_questions = 4
            temperature = 0.7
            implementation = "regex"
            eval_condition = "at_end"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.num_rounds, 3);
        assert_eq!(config.session.eval_condition, EvalCondition::AtEnd);
        assert_eq!(config.llm.model, "stub-model");
    }

    #[test]
    fn stub_provider_needs_no_api_key() {
        let config = LlmConfig::default().to_provider_config();
        assert!(config.api_key.is_none());
        assert_eq!(config.provider_type, LlmProviderType::Stub);
    }
}
