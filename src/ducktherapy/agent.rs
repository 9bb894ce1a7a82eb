//! The agent trait and its never-failing execution envelope.
//!
//! Concrete agents implement [`TherapyAgent::process`] and return either a
//! payload or an [`AgentError`].  Callers go through
//! [`TherapyAgent::safe_process`], which validates the context, times the
//! call and converts every error into a failure [`AgentResult`] — the
//! envelope itself never fails, so a misbehaving agent can degrade a
//! workflow but not abort it.

use crate::client_wrapper::Provider;
use crate::gateway::GatewayError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::timeout;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_PROBE_SESSION: &str = "health-probe";

#[derive(Debug)]
pub enum AgentError {
    /// Input failed validation before any work happened.
    Validation(String),
    /// A prompt template could not be prepared.
    Template(String),
    /// The LLM gateway refused or failed the call.
    Gateway(GatewayError),
    /// The model answered, but with something unusable.
    BadModelOutput(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Validation(msg) => write!(f, "validation failed: {}", msg),
            AgentError::Template(msg) => write!(f, "template error: {}", msg),
            AgentError::Gateway(err) => write!(f, "gateway error: {}", err),
            AgentError::BadModelOutput(msg) => write!(f, "unusable model output: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for AgentError {
    fn from(err: GatewayError) -> Self {
        AgentError::Gateway(err)
    }
}

/// Per-call context shared by every agent.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentContext {
    pub fn new(session_id: &str) -> Self {
        AgentContext {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// What a successful `process` call hands back: the payload plus, when an
/// LLM was involved, exactly which provider and model produced it.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub data: Value,
    pub provider_used: Option<(Provider, String)>,
}

impl AgentOutcome {
    pub fn new(data: Value) -> Self {
        AgentOutcome {
            data,
            provider_used: None,
        }
    }

    pub fn with_provider(data: Value, provider: Provider, model: String) -> Self {
        AgentOutcome {
            data,
            provider_used: Some((provider, model)),
        }
    }
}

/// Uniform envelope around one agent invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub success: bool,
    pub agent_name: String,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub processing_time_ms: u64,
    /// `(provider, model)` captured at dispatch time; `None` when the agent
    /// answered without an LLM call (safety gate, rule fallback).
    pub provider_used: Option<(Provider, String)>,
}

impl AgentResult {
    fn failure(agent_name: &str, error: String, elapsed: Duration) -> Self {
        AgentResult {
            success: false,
            agent_name: agent_name.to_string(),
            data: None,
            error: Some(error),
            processing_time_ms: elapsed.as_millis() as u64,
            provider_used: None,
        }
    }
}

/// Health reading for a single agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentHealth {
    pub agent_name: String,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait TherapyAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Do the actual work.  Implementations validate their own input shape
    /// and may call the gateway; they never need to catch their own errors.
    async fn process(&self, ctx: &AgentContext, input: &Value) -> Result<AgentOutcome, AgentError>;

    /// Input used by [`TherapyAgent::health_check`].  Agents with a richer
    /// input shape override this.
    fn probe_input(&self) -> Value {
        json!({ "text": "你好呀" })
    }

    /// Run `process` with validation, timing and error capture.  Always
    /// returns a well-formed [`AgentResult`].
    async fn safe_process(&self, ctx: &AgentContext, input: &Value) -> AgentResult {
        let started = Instant::now();

        if ctx.session_id.trim().is_empty() {
            warn!("{}: rejected call with empty session_id", self.name());
            return AgentResult::failure(
                self.name(),
                "validation failed: session_id must not be empty".to_string(),
                started.elapsed(),
            );
        }

        match self.process(ctx, input).await {
            Ok(outcome) => {
                let elapsed = started.elapsed();
                debug!(
                    "{}: processed in {}ms (session {})",
                    self.name(),
                    elapsed.as_millis(),
                    ctx.session_id
                );
                AgentResult {
                    success: true,
                    agent_name: self.name().to_string(),
                    data: Some(outcome.data),
                    error: None,
                    processing_time_ms: elapsed.as_millis() as u64,
                    provider_used: outcome.provider_used,
                }
            }
            Err(err) => {
                error!("{}: {} (session {})", self.name(), err, ctx.session_id);
                AgentResult::failure(self.name(), err.to_string(), started.elapsed())
            }
        }
    }

    /// Probe the agent with a synthetic input under a bounded timeout.
    async fn health_check(&self) -> AgentHealth {
        let started = Instant::now();
        let ctx = AgentContext::new(HEALTH_PROBE_SESSION);
        let input = self.probe_input();

        let result = timeout(HEALTH_PROBE_TIMEOUT, self.safe_process(&ctx, &input)).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(agent_result) => AgentHealth {
                agent_name: self.name().to_string(),
                healthy: agent_result.success,
                latency_ms,
                error: agent_result.error,
            },
            Err(_) => AgentHealth {
                agent_name: self.name().to_string(),
                healthy: false,
                latency_ms,
                error: Some(format!("health probe timed out after {:?}", HEALTH_PROBE_TIMEOUT)),
            },
        }
    }
}

/// Fill `{placeholder}` slots in a task template description.
pub(crate) fn fill_template(description: &str, substitutions: &[(&str, &str)]) -> String {
    let mut filled = description.to_string();
    for (key, value) in substitutions {
        filled = filled.replace(&format!("{{{}}}", key), value);
    }
    filled
}
