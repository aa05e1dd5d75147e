//! Active preference elicitation.
//!
//! An agent infers a hidden target format - a regular expression describing
//! a set of strings - by iteratively asking an oracle the most informative
//! question it can come up with. The oracle is either an LLM-backed
//! simulated persona or a human answering through the same channel.
//!
//! ## Architecture
//!
//! - [`prompt`]: deterministic composition of generation, selection,
//!   hypothesis, and oracle requests.
//! - [`agent`]: the capability trait plus its two variants - autonomous
//!   question generation and human-driven input - selected at session
//!   construction.
//! - [`llm`]: the query service (providers plus a durable response cache
//!   keyed by exact request content and temperature).
//! - [`session`]: the append-only interaction history.
//! - [`scoring`]: regex-hypothesis generation and test-case evaluation.
//! - [`metrics`]: per-round metric accumulation with baseline-relative
//!   views.
//! - [`elicitation`]: the round loop tying it all together.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use elicit::agent::GenerativeQuestionsAgent;
//! use elicit::elicitation::{run_session, LoopConfig};
//! use elicit::llm::{QueryService, StubProvider};
//! use elicit::transcript::TranscriptWriter;
//! use elicit::types::ProblemInstance;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let instance = ProblemInstance::load("tasks/email_regex/instance_0.json")
//!         .expect("failed to load instance");
//!     let service = QueryService::stubbed(StubProvider::new(Default::default()));
//!     let mut agent =
//!         GenerativeQuestionsAgent::new(instance, service, 0.0, "open", "regex", 1)
//!             .expect("failed to build agent");
//!
//!     let mut transcript = TranscriptWriter::new(Vec::new());
//!     let outcome = run_session(&mut agent, &LoopConfig::default(), None, Some(&mut transcript))
//!         .await
//!         .expect("session failed");
//!     println!("completed {} rounds", outcome.completed_rounds);
//! });
//! ```

pub mod agent;
pub mod config;
pub mod elicitation;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod prompt;
pub mod scoring;
pub mod session;
pub mod transcript;
pub mod types;

// Re-export main types for easy access
pub use agent::{ActiveLearningAgent, GenerativeQuestionsAgent, InteractiveUserAgent};
pub use config::{ElicitConfig, LlmConfig, SessionConfig};
pub use elicitation::{run_session, EvalCondition, LoopConfig, QueryInput, SessionOutcome};
pub use error::{ElicitError, Result};
pub use llm::{LlmProvider, LlmProviderConfig, LlmProviderType, QueryService, ResponseCache};
pub use metrics::{update_metrics, MetricsAccumulator, ScoreRecord};
pub use session::InteractionSession;
pub use types::{ChatMessage, InteractionTurn, ProblemInstance, QuestionType, TestCase};
