//! Workflow orchestration.
//!
//! A workflow is a short pipeline of agent steps.  Two are built in:
//!
//! * `basic_chat_flow` — emotion analysis, then duck styling.
//! * `enhanced_chat_flow` — emotion analysis, then a concurrent enrichment
//!   group (content recommendation; self-help suggestions when the emotion
//!   is intense), then duck styling.
//!
//! [`WorkflowEngine::run_workflow`] always returns a well-formed
//! [`WorkflowResult`]; step failures degrade the run (see
//! [`WorkflowStatus`]) and engine-level problems, including unknown workflow
//! names, come back as `Failed` results rather than errors.

use crate::agent::{AgentContext, AgentResult};
use crate::client_wrapper::Provider;
use crate::config::{
    ConfigError, ConfigStore, BASIC_CHAT_FLOW, CONTENT_RECALL_AGENT, CONTENT_RECOMMENDATION_TASK,
    DEFAULT_FALLBACK_REPLY, DUCK_STYLE_AGENT, DUCK_STYLE_TASK, EMOTION_ANALYSIS_TASK,
    ENHANCED_CHAT_FLOW, LISTENER_AGENT, THERAPY_SUGGESTION_TASK, THERAPY_TIPS_AGENT,
};
use crate::event::ProgressEvent;
use crate::gateway::LlmGateway;
use crate::health::{check_system, SystemHealth};
use crate::registry::AgentRegistry;
use crate::session::{MessageKind, SessionStore};
use chrono::{DateTime, Utc};
use futures_channel::mpsc;
use futures_util::Stream;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Emotion intensity above which the enhanced flow adds the self-help step.
const THERAPY_INTENSITY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    PartiallyCompleted,
}

/// Outcome of one workflow step.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task_name: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub agent_used: String,
    /// `(provider, model)` attribution carried through from the agent.
    pub provider_used: Option<(Provider, String)>,
}

impl TaskResult {
    fn from_agent(task_name: &str, agent_result: AgentResult) -> Self {
        TaskResult {
            task_name: task_name.to_string(),
            success: agent_result.success,
            data: agent_result.data,
            error: agent_result.error,
            execution_time_ms: agent_result.processing_time_ms,
            agent_used: agent_result.agent_name,
            provider_used: agent_result.provider_used,
        }
    }

    fn failure(task_name: &str, agent_name: &str, error: String) -> Self {
        TaskResult {
            task_name: task_name.to_string(),
            success: false,
            data: None,
            error: Some(error),
            execution_time_ms: 0,
            agent_used: agent_name.to_string(),
            provider_used: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub workflow_id: Uuid,
    pub workflow_type: String,
    pub status: WorkflowStatus,
    pub task_results: Vec<TaskResult>,
    pub final_output: Option<Value>,
    pub total_execution_time_ms: u64,
    pub success_rate: f64,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl WorkflowResult {
    /// Map a success rate onto a status.  All steps succeeding is the only
    /// way to `Completed`; strictly more than half keeps the run
    /// `PartiallyCompleted`.
    pub fn status_for(success_rate: f64) -> WorkflowStatus {
        if success_rate == 1.0 {
            WorkflowStatus::Completed
        } else if success_rate > 0.5 {
            WorkflowStatus::PartiallyCompleted
        } else {
            WorkflowStatus::Failed
        }
    }

    pub fn success_rate_of(task_results: &[TaskResult]) -> f64 {
        if task_results.is_empty() {
            return 0.0;
        }
        let successes = task_results.iter().filter(|t| t.success).count();
        successes as f64 / task_results.len() as f64
    }

    fn response_text(&self) -> Option<&str> {
        self.final_output
            .as_ref()
            .and_then(|output| output.get("response_text"))
            .and_then(Value::as_str)
    }
}

/// Orchestrates agents into workflows and records the conversation.
pub struct WorkflowEngine {
    config: RwLock<Arc<ConfigStore>>,
    registry: RwLock<Arc<AgentRegistry>>,
    gateway: Arc<LlmGateway>,
    sessions: Arc<SessionStore>,
}

impl WorkflowEngine {
    pub fn new(
        config: Arc<ConfigStore>,
        gateway: Arc<LlmGateway>,
        sessions: Arc<SessionStore>,
    ) -> Result<Self, ConfigError> {
        let registry = AgentRegistry::from_config(&config, &gateway)?;
        Ok(WorkflowEngine {
            config: RwLock::new(config),
            registry: RwLock::new(Arc::new(registry)),
            gateway,
            sessions,
        })
    }

    /// Build an engine around a hand-assembled registry.  Used by tests and
    /// by embedders that bring their own agents.
    pub fn with_registry(
        registry: AgentRegistry,
        config: Arc<ConfigStore>,
        gateway: Arc<LlmGateway>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        WorkflowEngine {
            config: RwLock::new(config),
            registry: RwLock::new(Arc::new(registry)),
            gateway,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn gateway(&self) -> &Arc<LlmGateway> {
        &self.gateway
    }

    /// Rebuild the agent set from a fresh configuration.  The swap is
    /// all-or-nothing: on any error the previous snapshot keeps serving.
    pub async fn reload(&self, config: ConfigStore) -> Result<(), ConfigError> {
        let config = Arc::new(config);
        let registry = AgentRegistry::from_config(&config, &self.gateway)?;
        *self.registry.write().await = Arc::new(registry);
        *self.config.write().await = config;
        info!("configuration reloaded, agent registry swapped");
        Ok(())
    }

    /// Probe every agent and provider and aggregate the results.
    pub async fn system_health(&self) -> SystemHealth {
        let registry = self.registry.read().await.clone();
        check_system(&registry, &self.gateway).await
    }

    /// Execute a workflow and record its conversation side effects.
    pub async fn run_workflow(
        &self,
        workflow_type: &str,
        user_message: &str,
        session_id: &str,
    ) -> WorkflowResult {
        let result = self.execute(workflow_type, user_message, session_id).await;
        self.record_session(&result, user_message, session_id).await;
        result
    }

    async fn execute(&self, workflow_type: &str, user_message: &str, session_id: &str) -> WorkflowResult {
        let workflow_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        info!(
            "workflow {} started: type={} session={}",
            workflow_id, workflow_type, session_id
        );

        let config = self.config.read().await.clone();
        if let Err(err) = config.workflow(workflow_type) {
            warn!("workflow {} rejected: {}", workflow_id, err);
            return Self::failed(workflow_id, workflow_type, started_at, started, err.to_string());
        }

        match workflow_type {
            BASIC_CHAT_FLOW => {
                self.basic_chat_flow(workflow_id, user_message, session_id, started_at, started)
                    .await
            }
            ENHANCED_CHAT_FLOW => {
                self.enhanced_chat_flow(workflow_id, user_message, session_id, started_at, started)
                    .await
            }
            other => {
                error!("workflow {} has no executor: {}", workflow_id, other);
                Self::failed(
                    workflow_id,
                    other,
                    started_at,
                    started,
                    format!("no executor for workflow: {}", other),
                )
            }
        }
    }

    /// Run a single step via the current registry snapshot.
    async fn run_task(&self, task_name: &str, agent_name: &str, input: Value, session_id: &str) -> TaskResult {
        let registry = self.registry.read().await.clone();
        match registry.get(agent_name) {
            Some(agent) => {
                let ctx = AgentContext::new(session_id);
                TaskResult::from_agent(task_name, agent.safe_process(&ctx, &input).await)
            }
            None => {
                error!("task {} skipped: agent not found: {}", task_name, agent_name);
                TaskResult::failure(task_name, agent_name, format!("agent not found: {}", agent_name))
            }
        }
    }

    async fn emotion_step(&self, user_message: &str, session_id: &str) -> TaskResult {
        self.run_task(
            EMOTION_ANALYSIS_TASK,
            LISTENER_AGENT,
            json!({ "text": user_message }),
            session_id,
        )
        .await
    }

    async fn style_step(&self, user_message: &str, emotion_payload: Value, session_id: &str) -> TaskResult {
        self.run_task(
            DUCK_STYLE_TASK,
            DUCK_STYLE_AGENT,
            json!({
                "user_message": user_message,
                "emotion_analysis": emotion_payload,
            }),
            session_id,
        )
        .await
    }

    async fn basic_chat_flow(
        &self,
        workflow_id: Uuid,
        user_message: &str,
        session_id: &str,
        started_at: DateTime<Utc>,
        started: Instant,
    ) -> WorkflowResult {
        let emotion = self.emotion_step(user_message, session_id).await;
        // A failed analysis hands the styling step an empty payload; the
        // styling agent treats that as a neutral read.
        let emotion_payload = emotion.data.clone().unwrap_or_else(|| json!({}));
        let style = self.style_step(user_message, emotion_payload, session_id).await;

        let final_output = Self::final_output_of(BASIC_CHAT_FLOW, &emotion, &style);
        Self::finalize(
            workflow_id,
            BASIC_CHAT_FLOW,
            vec![emotion, style],
            final_output,
            started_at,
            started,
        )
    }

    async fn enhanced_chat_flow(
        &self,
        workflow_id: Uuid,
        user_message: &str,
        session_id: &str,
        started_at: DateTime<Utc>,
        started: Instant,
    ) -> WorkflowResult {
        let emotion = self.emotion_step(user_message, session_id).await;
        let emotion_payload = emotion.data.clone().unwrap_or_else(|| json!({}));
        let intensity = emotion_payload
            .get("intensity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        // Enrichment group runs concurrently.  Content recommendation needs
        // a successful analysis; the self-help step only fires for intense
        // emotions.
        let (content, therapy) = tokio::join!(
            async {
                if emotion.success {
                    Some(
                        self.run_task(
                            CONTENT_RECOMMENDATION_TASK,
                            CONTENT_RECALL_AGENT,
                            json!({ "emotion_analysis": emotion_payload.clone() }),
                            session_id,
                        )
                        .await,
                    )
                } else {
                    None
                }
            },
            async {
                if intensity > THERAPY_INTENSITY_THRESHOLD {
                    Some(
                        self.run_task(
                            THERAPY_SUGGESTION_TASK,
                            THERAPY_TIPS_AGENT,
                            json!({ "emotion_analysis": emotion_payload.clone() }),
                            session_id,
                        )
                        .await,
                    )
                } else {
                    None
                }
            }
        );

        let style = self
            .style_step(user_message, emotion_payload.clone(), session_id)
            .await;

        let final_output = Self::final_output_of(ENHANCED_CHAT_FLOW, &emotion, &style).map(|mut output| {
            if let Some(content) = content.as_ref().filter(|t| t.success).and_then(|t| t.data.clone()) {
                output["content_recommendation"] = content;
            }
            if let Some(therapy) = therapy.as_ref().filter(|t| t.success).and_then(|t| t.data.clone()) {
                output["therapy_suggestion"] = therapy;
            }
            output
        });

        let mut task_results = vec![emotion];
        if let Some(content) = content {
            task_results.push(content);
        }
        if let Some(therapy) = therapy {
            task_results.push(therapy);
        }
        task_results.push(style);

        Self::finalize(
            workflow_id,
            ENHANCED_CHAT_FLOW,
            task_results,
            final_output,
            started_at,
            started,
        )
    }

    /// The user-facing output exists only when the styling step succeeded.
    fn final_output_of(workflow_type: &str, emotion: &TaskResult, style: &TaskResult) -> Option<Value> {
        if !style.success {
            return None;
        }
        let response_text = style
            .data
            .as_ref()
            .and_then(|d| d.get("response_text"))
            .cloned()
            .unwrap_or(Value::Null);
        Some(json!({
            "response_text": response_text,
            "emotion_analysis": emotion.data.clone().unwrap_or(Value::Null),
            "workflow_type": workflow_type,
        }))
    }

    fn finalize(
        workflow_id: Uuid,
        workflow_type: &str,
        task_results: Vec<TaskResult>,
        final_output: Option<Value>,
        started_at: DateTime<Utc>,
        started: Instant,
    ) -> WorkflowResult {
        let success_rate = WorkflowResult::success_rate_of(&task_results);
        let status = WorkflowResult::status_for(success_rate);
        let total_execution_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "workflow {} finished: status={:?} rate={:.2} in {}ms",
            workflow_id, status, success_rate, total_execution_time_ms
        );
        WorkflowResult {
            workflow_id,
            workflow_type: workflow_type.to_string(),
            status,
            task_results,
            final_output,
            total_execution_time_ms,
            success_rate,
            error: None,
            started_at,
            completed_at: Utc::now(),
        }
    }

    fn failed(
        workflow_id: Uuid,
        workflow_type: &str,
        started_at: DateTime<Utc>,
        started: Instant,
        error: String,
    ) -> WorkflowResult {
        WorkflowResult {
            workflow_id,
            workflow_type: workflow_type.to_string(),
            status: WorkflowStatus::Failed,
            task_results: Vec::new(),
            final_output: None,
            total_execution_time_ms: started.elapsed().as_millis() as u64,
            success_rate: 0.0,
            error: Some(error),
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Ledger side effects of one run: the user message, the emotion
    /// reading, and the assistant reply (or the canned fallback).
    async fn record_session(&self, result: &WorkflowResult, user_message: &str, session_id: &str) {
        self.sessions
            .append_message(session_id, MessageKind::User, user_message, None, Some(&result.workflow_type))
            .await;

        let emotion = result
            .task_results
            .iter()
            .find(|t| t.task_name == EMOTION_ANALYSIS_TASK && t.success)
            .and_then(|t| t.data.clone());
        if let Some(analysis) = emotion.clone() {
            self.sessions.append_emotion(session_id, analysis).await;
        }

        let reply = result.response_text().unwrap_or(DEFAULT_FALLBACK_REPLY);
        self.sessions
            .append_message(
                session_id,
                MessageKind::Assistant,
                reply,
                emotion,
                Some(&result.workflow_type),
            )
            .await;
    }

    /// Streaming variant of the chat path.  Yields a finite, ordered event
    /// sequence and records the same session side effects as
    /// [`WorkflowEngine::run_workflow`].
    pub fn run_workflow_stream(
        self: &Arc<Self>,
        workflow_type: &str,
        user_message: &str,
        session_id: &str,
    ) -> Pin<Box<dyn Stream<Item = ProgressEvent> + Send>> {
        let (tx, rx) = mpsc::unbounded();
        let engine = Arc::clone(self);
        let workflow_type = workflow_type.to_string();
        let user_message = user_message.to_string();
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            let started = Instant::now();
            let _ = tx.unbounded_send(ProgressEvent::Started {
                workflow_type: workflow_type.clone(),
                session_id: session_id.clone(),
            });

            let config = engine.config.read().await.clone();
            if let Err(err) = config.workflow(&workflow_type) {
                // Rejected runs still leave the same ledger behind as the
                // blocking path: the user message and the canned reply.
                engine
                    .sessions
                    .append_message(&session_id, MessageKind::User, &user_message, None, Some(&workflow_type))
                    .await;
                engine
                    .sessions
                    .append_message(&session_id, MessageKind::Assistant, DEFAULT_FALLBACK_REPLY, None, Some(&workflow_type))
                    .await;
                let _ = tx.unbounded_send(ProgressEvent::Error {
                    message: err.to_string(),
                });
                return;
            }

            let _ = tx.unbounded_send(ProgressEvent::AnalysisStarted);
            let emotion = engine.emotion_step(&user_message, &session_id).await;
            let _ = tx.unbounded_send(ProgressEvent::AnalysisCompleted {
                success: emotion.success,
                emotion_analysis: emotion.data.clone(),
            });

            let _ = tx.unbounded_send(ProgressEvent::ResponseStarted);
            let emotion_payload = emotion.data.clone().unwrap_or_else(|| json!({}));
            let style = engine
                .style_step(&user_message, emotion_payload, &session_id)
                .await;

            let task_results = vec![emotion, style];
            let success_rate = WorkflowResult::success_rate_of(&task_results);
            let style = &task_results[1];

            let response_text = style
                .data
                .as_ref()
                .and_then(|d| d.get("response_text"))
                .and_then(Value::as_str)
                .map(String::from);

            // Same ledger side effects as the non-streaming path.
            engine
                .sessions
                .append_message(&session_id, MessageKind::User, &user_message, None, Some(&workflow_type))
                .await;
            let emotion_data = task_results[0].data.clone().filter(|_| task_results[0].success);
            if let Some(analysis) = emotion_data.clone() {
                engine.sessions.append_emotion(&session_id, analysis).await;
            }
            let reply = response_text.as_deref().unwrap_or(DEFAULT_FALLBACK_REPLY);
            engine
                .sessions
                .append_message(&session_id, MessageKind::Assistant, reply, emotion_data, Some(&workflow_type))
                .await;

            match response_text {
                Some(text) if style.success => {
                    let _ = tx.unbounded_send(ProgressEvent::ResponseCompleted {
                        response_text: text,
                    });
                    let _ = tx.unbounded_send(ProgressEvent::Completed {
                        total_execution_time_ms: started.elapsed().as_millis() as u64,
                        success_rate,
                    });
                }
                _ => {
                    let _ = tx.unbounded_send(ProgressEvent::Error {
                        message: style
                            .error
                            .clone()
                            .unwrap_or_else(|| "styling step produced no response".to_string()),
                    });
                }
            }
        });

        Box::pin(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_task(name: &str, success: bool) -> TaskResult {
        TaskResult {
            task_name: name.to_string(),
            success,
            data: None,
            error: if success { None } else { Some("boom".to_string()) },
            execution_time_ms: 1,
            agent_used: "stub".to_string(),
            provider_used: None,
        }
    }

    #[test]
    fn status_thresholds_are_exact() {
        assert_eq!(WorkflowResult::status_for(1.0), WorkflowStatus::Completed);
        assert_eq!(WorkflowResult::status_for(0.75), WorkflowStatus::PartiallyCompleted);
        assert_eq!(WorkflowResult::status_for(0.5), WorkflowStatus::Failed);
        assert_eq!(WorkflowResult::status_for(0.51), WorkflowStatus::PartiallyCompleted);
        assert_eq!(WorkflowResult::status_for(0.0), WorkflowStatus::Failed);
    }

    #[test]
    fn success_rate_of_empty_task_list_is_zero() {
        assert_eq!(WorkflowResult::success_rate_of(&[]), 0.0);
        let tasks = vec![stub_task("a", true), stub_task("b", false)];
        assert_eq!(WorkflowResult::success_rate_of(&tasks), 0.5);
    }
}
