mod common;

use common::{mock_gateway, MockClient};
use ducktherapy::agent::{AgentContext, TherapyAgent};
use ducktherapy::agents::ListenerAgent;
use ducktherapy::client_wrapper::Provider;
use ducktherapy::config::{ConfigStore, Settings, EMOTION_ANALYSIS_TASK, LISTENER_AGENT};
use serde_json::json;
use std::sync::Arc;

fn listener_with(client: Arc<dyn ducktherapy::client_wrapper::ClientWrapper>) -> ListenerAgent {
    let config = ConfigStore::builtin(Settings::default());
    let agent_config = config.agent_config(LISTENER_AGENT).unwrap();
    let gateway = Arc::new(mock_gateway(vec![(Provider::OpenAi, client)]));
    ListenerAgent::new(
        LISTENER_AGENT,
        agent_config,
        config.task_template(EMOTION_ANALYSIS_TASK).unwrap().clone(),
        agent_config.emotion_rules.clone().unwrap(),
        gateway,
    )
}

#[tokio::test]
async fn model_json_is_merged_onto_the_rule_analysis() {
    let reply = r#"{"sentiment": "positive", "intensity": 0.9, "keywords": ["今天"]}"#;
    let (client, _) = MockClient::replying("mock-gpt", reply);
    let listener = listener_with(client);

    let result = listener
        .safe_process(&AgentContext::new("s1"), &json!({ "text": "我今天非常开心" }))
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["sentiment"], "positive");
    // Merged intensity is the max of the model (0.9) and rule readings,
    // modulo f32 round-tripping.
    assert!(data["intensity"].as_f64().unwrap() > 0.85);
    let emotions: Vec<&str> = data["primary_emotions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(emotions.contains(&"开心"));
    // Attribution comes from the dispatch point.
    assert_eq!(result.provider_used.as_ref().unwrap().1, "mock-gpt");
}

#[tokio::test]
async fn gateway_failure_falls_back_to_rule_analysis() {
    let (client, calls) = MockClient::failing("mock-gpt");
    let listener = listener_with(client);

    let result = listener
        .safe_process(&AgentContext::new("s1"), &json!({ "text": "我今天非常开心" }))
        .await;

    assert!(result.success);
    assert!(result.provider_used.is_none());
    let data = result.data.unwrap();
    assert_eq!(data["sentiment"], "positive");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unparsable_model_reply_keeps_the_rule_result() {
    let (client, _) = MockClient::replying("mock-gpt", "今天的天气真不错呀");
    let listener = listener_with(client);

    let result = listener
        .safe_process(&AgentContext::new("s1"), &json!({ "text": "我很难过，压力好大" }))
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["sentiment"], "negative");
    assert!(data["primary_emotions"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn empty_text_is_rejected_without_a_model_call() {
    let (client, calls) = MockClient::replying("mock-gpt", "{}");
    let listener = listener_with(client);

    let result = listener
        .safe_process(&AgentContext::new("s1"), &json!({ "text": "   " }))
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("text"));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_session_id_is_rejected_before_processing() {
    let (client, calls) = MockClient::replying("mock-gpt", "{}");
    let listener = listener_with(client);

    let result = listener
        .safe_process(&AgentContext::new(""), &json!({ "text": "你好" }))
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("session_id"));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
