//! Query service: providers plus the durable response cache.
//!
//! All generation and oracle traffic in a session flows through one
//! [`QueryService`]. Requests are keyed by exact content and temperature;
//! a cached response is replayed without touching the provider.

pub mod cache;
pub mod provider;

pub use cache::{request_key, ResponseCache};
pub use provider::{
    AnthropicProvider, LlmProvider, LlmProviderConfig, LlmProviderType, OpenAiProvider,
    ProviderFactory, ProviderInfo, StubProvider,
};

use crate::error::Result;
use crate::types::ChatMessage;

/// Front door for all LLM traffic in a session.
pub struct QueryService {
    provider: Box<dyn LlmProvider + Send + Sync>,
    cache: Option<ResponseCache>,
}

impl QueryService {
    pub fn new(provider: Box<dyn LlmProvider + Send + Sync>, cache: Option<ResponseCache>) -> Self {
        Self { provider, cache }
    }

    /// Build a service around a stub provider, for tests and offline runs.
    pub fn stubbed(provider: StubProvider) -> Self {
        Self {
            provider: Box::new(provider),
            cache: None,
        }
    }

    pub fn provider_info(&self) -> ProviderInfo {
        self.provider.info()
    }

    /// Issue one request, serving it from the cache when possible.
    pub async fn query(&mut self, messages: &[ChatMessage], temperature: f64) -> Result<String> {
        let key = match &self.cache {
            Some(_) => Some(request_key(messages, temperature)?),
            None => None,
        };

        if let (Some(cache), Some(key)) = (self.cache.as_mut(), key.as_deref()) {
            if let Some(response) = cache.get(key) {
                tracing::debug!(target: "elicit::llm", %key, "cache hit");
                return Ok(response);
            }
        }

        let response = self.provider.chat(messages, temperature).await?;

        if let (Some(cache), Some(key)) = (self.cache.as_mut(), key) {
            cache.put(key, response.clone())?;
        }
        Ok(response)
    }
}
