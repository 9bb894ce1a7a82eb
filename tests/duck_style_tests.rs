mod common;

use common::{mock_gateway, MockClient};
use ducktherapy::agent::{AgentContext, TherapyAgent};
use ducktherapy::agents::DuckStyleAgent;
use ducktherapy::client_wrapper::Provider;
use ducktherapy::config::{
    builtin_safety_rules, ConfigStore, Settings, DUCK_STYLE_AGENT, DUCK_STYLE_TASK,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn duck_with(client: Arc<dyn ducktherapy::client_wrapper::ClientWrapper>) -> DuckStyleAgent {
    let config = ConfigStore::builtin(Settings::default());
    let gateway = Arc::new(mock_gateway(vec![(Provider::OpenAi, client)]));
    DuckStyleAgent::new(
        DUCK_STYLE_AGENT,
        config.agent_config(DUCK_STYLE_AGENT).unwrap(),
        config.task_template(DUCK_STYLE_TASK).unwrap().clone(),
        gateway,
    )
    .unwrap()
}

#[tokio::test]
async fn crisis_input_returns_the_exact_configured_response_with_zero_llm_calls() {
    let (client, calls) = MockClient::replying("mock-gpt", "不应该被用到");
    let duck = duck_with(client);

    let result = duck
        .safe_process(&AgentContext::new("s1"), &json!({ "user_message": "我真的不想活了" }))
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["safety_triggered"], true);
    assert_eq!(data["safety_reason"], "crisis");
    assert_eq!(
        data["response_text"].as_str().unwrap(),
        builtin_safety_rules().crisis_response
    );
    assert!(result.provider_used.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn medical_questions_are_deflected_without_a_model_call() {
    let (client, calls) = MockClient::replying("mock-gpt", "不应该被用到");
    let duck = duck_with(client);

    let result = duck
        .safe_process(&AgentContext::new("s1"), &json!({ "user_message": "我是不是得了抑郁症？" }))
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["safety_reason"], "medical");
    assert_eq!(
        data["response_text"].as_str().unwrap(),
        builtin_safety_rules().medical_response
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn model_replies_are_styled_into_duck_voice() {
    let (client, calls) = MockClient::replying("mock-gpt", "我在这里听你说，慢慢讲");
    let duck = duck_with(client);

    let emotion = json!({ "sentiment": "negative", "primary_emotions": ["悲伤"], "intensity": 0.7 });
    let result = duck
        .safe_process(
            &AgentContext::new("s1"),
            &json!({ "user_message": "我今天被批评了，很难过", "emotion_analysis": emotion }),
        )
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    let text = data["response_text"].as_str().unwrap();
    assert!(text.contains("鸭鸭"));
    assert_eq!(data["safety_triggered"], false);
    assert_eq!(data["fallback_used"], false);
    assert_eq!(result.provider_used, Some((Provider::OpenAi, "mock-gpt".to_string())));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gateway_failure_uses_the_canned_duck_reply() {
    let (client, _) = MockClient::failing("mock-gpt");
    let duck = duck_with(client);

    let emotion = json!({ "sentiment": "negative", "primary_emotions": ["焦虑"] });
    let result = duck
        .safe_process(
            &AgentContext::new("s1"),
            &json!({ "user_message": "考试快到了，压力好大", "emotion_analysis": emotion }),
        )
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["fallback_used"], true);
    assert!(data["response_text"].as_str().unwrap().contains("鸭鸭"));
    assert!(result.provider_used.is_none());
}

#[tokio::test]
async fn empty_emotion_payload_is_treated_as_neutral() {
    let (client, _) = MockClient::replying("mock-gpt", "我在呢");
    let duck = duck_with(client);

    let result = duck
        .safe_process(
            &AgentContext::new("s1"),
            &json!({ "user_message": "随便聊聊", "emotion_analysis": {} }),
        )
        .await;

    assert!(result.success);
    assert!(result.data.unwrap()["response_text"].as_str().unwrap().contains("鸭鸭"));
}
