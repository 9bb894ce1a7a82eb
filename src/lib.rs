//! # ducktherapy
//!
//! ducktherapy is the backend of a duck-persona emotional support companion:
//! a small team of agents that read the emotion in a user's message and
//! answer in a warm "鸭鸭" (duckling) voice, orchestrated into workflows over
//! a multi-provider LLM gateway.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Agents**: [`TherapyAgent`] implementations for emotion analysis
//!   ([`agents::ListenerAgent`]), persona styling with a pre-LLM safety gate
//!   ([`agents::DuckStyleAgent`]), and the enrichment pair
//!   ([`agents::ContentRecallAgent`], [`agents::TherapyTipsAgent`]) — every
//!   call wrapped in a never-failing [`TherapyAgent::safe_process`] envelope
//! * **Provider Flexibility**: [`ClientWrapper`] trait implemented for
//!   OpenAI, Anthropic (through its OpenAI-compatible endpoint) and Ollama,
//!   routed by [`LlmGateway`] with health tracking and two explicit fallback
//!   strategies
//! * **Workflows**: [`WorkflowEngine`] composing agent steps into
//!   `basic_chat_flow` and `enhanced_chat_flow`, with aggregate status
//!   accounting and a streaming variant emitting typed [`ProgressEvent`]s
//! * **Sessions**: an in-memory [`SessionStore`] ledger of messages and
//!   emotion history per conversation
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ducktherapy::config::{ConfigStore, Settings, BASIC_CHAT_FLOW};
//! use ducktherapy::gateway::LlmGateway;
//! use ducktherapy::session::SessionStore;
//! use ducktherapy::workflow::WorkflowEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ducktherapy::init_logger();
//!
//!     let settings = Settings::from_env();
//!     let config = Arc::new(ConfigStore::builtin(settings.clone()));
//!     let gateway = Arc::new(LlmGateway::new(settings));
//!     let sessions = Arc::new(SessionStore::new());
//!
//!     let engine = WorkflowEngine::new(config, gateway, sessions)?;
//!     let result = engine
//!         .run_workflow(BASIC_CHAT_FLOW, "我今天有点难过", "session-1")
//!         .await;
//!
//!     println!("{:?}", result.final_output);
//!     Ok(())
//! }
//! ```
//!
//! Configuration can also be loaded (and later hot-reloaded through
//! [`WorkflowEngine::reload`]) from `agents.yaml`/`tasks.yaml` via
//! [`config::ConfigStore::load`]; the reload swaps the whole agent set
//! atomically and keeps the previous one on any error.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// ```rust
/// ducktherapy::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `ducktherapy` module.
pub mod ducktherapy;

// Re-exporting key items for easier external access.
pub use ducktherapy::agent;
pub use ducktherapy::agent::{AgentContext, AgentError, AgentHealth, AgentOutcome, AgentResult, TherapyAgent};
pub use ducktherapy::agents;
pub use ducktherapy::client_wrapper;
pub use ducktherapy::client_wrapper::{ClientWrapper, GenerateOptions, Provider};
pub use ducktherapy::clients;
pub use ducktherapy::config;
pub use ducktherapy::config::{ConfigError, ConfigStore, Settings};
pub use ducktherapy::emotion;
pub use ducktherapy::emotion::{normalize_sentiment, EmotionAnalysis, Sentiment};
pub use ducktherapy::event;
pub use ducktherapy::event::ProgressEvent;
pub use ducktherapy::gateway;
pub use ducktherapy::gateway::{GatewayError, Generation, LlmGateway, ProviderHealth};
pub use ducktherapy::health;
pub use ducktherapy::health::{HealthStatus, SystemHealth};
pub use ducktherapy::registry;
pub use ducktherapy::registry::AgentRegistry;
pub use ducktherapy::session;
pub use ducktherapy::session::{MessageKind, Session, SessionStore};
pub use ducktherapy::workflow;
pub use ducktherapy::workflow::{TaskResult, WorkflowEngine, WorkflowResult, WorkflowStatus};
