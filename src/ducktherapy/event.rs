//! Progress events emitted by the streaming workflow variant.
//!
//! The stream returned by
//! [`WorkflowEngine::run_workflow_stream`](crate::workflow::WorkflowEngine::run_workflow_stream)
//! is finite and ordered: `Started`, `AnalysisStarted`, `AnalysisCompleted`,
//! `ResponseStarted`, then either `ResponseCompleted` + `Completed` or a
//! single `Error`.  Events serialize with a `type` tag so a transport can
//! forward them as-is (e.g. as server-sent events).

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started {
        workflow_type: String,
        session_id: String,
    },
    AnalysisStarted,
    AnalysisCompleted {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        emotion_analysis: Option<Value>,
    },
    ResponseStarted,
    ResponseCompleted {
        response_text: String,
    },
    Completed {
        total_execution_time_ms: u64,
        success_rate: f64,
    },
    Error {
        message: String,
    },
}
