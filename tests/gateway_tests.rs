mod common;

use common::{mock_gateway, MockClient};
use ducktherapy::client_wrapper::{GenerateOptions, Provider};
use ducktherapy::gateway::GatewayError;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn resolve_returns_the_requested_provider_when_available() {
    let (client, _) = MockClient::replying("mock-gpt", "hi");
    let gateway = mock_gateway(vec![(Provider::OpenAi, client)]);
    assert_eq!(gateway.resolve(Provider::OpenAi).await.unwrap(), Provider::OpenAi);
}

#[tokio::test]
async fn resolve_walks_the_fallback_chain_past_unhealthy_providers() {
    let (openai, _) = MockClient::replying("mock-gpt", "hi");
    let (anthropic, _) = MockClient::replying("mock-claude", "hi");
    let gateway = mock_gateway(vec![
        (Provider::OpenAi, openai),
        (Provider::Anthropic, anthropic),
    ]);

    gateway.set_health(Provider::OpenAi, false).await;
    assert_eq!(gateway.resolve(Provider::OpenAi).await.unwrap(), Provider::Anthropic);
}

#[tokio::test]
async fn resolve_fails_when_no_provider_is_available() {
    let gateway = mock_gateway(vec![]);
    match gateway.resolve(Provider::OpenAi).await {
        Err(GatewayError::NoProviderAvailable(requested)) => {
            assert_eq!(requested, Provider::OpenAi)
        }
        other => panic!("expected NoProviderAvailable, got {:?}", other.map(|p| p.to_string())),
    }
}

#[tokio::test]
async fn generations_carry_provider_and_model_attribution() {
    let (client, calls) = MockClient::replying("mock-gpt", "你好");
    let gateway = mock_gateway(vec![(Provider::OpenAi, client)]);

    let generation = gateway
        .generate(Provider::OpenAi, "嗨", &GenerateOptions::default())
        .await
        .unwrap();

    assert_eq!(generation.text, "你好");
    assert_eq!(generation.provider, Provider::OpenAi);
    assert_eq!(generation.model, "mock-gpt");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn primary_failure_retries_exactly_once_via_the_configured_fallback() {
    let (openai, openai_calls) = MockClient::failing("mock-gpt");
    let (anthropic, anthropic_calls) = MockClient::replying("mock-claude", "接住了");
    let gateway = mock_gateway(vec![
        (Provider::OpenAi, openai),
        (Provider::Anthropic, anthropic),
    ]);

    let generation = gateway
        .generate(Provider::OpenAi, "嗨", &GenerateOptions::default())
        .await
        .unwrap();

    assert_eq!(generation.provider, Provider::Anthropic);
    assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
    assert_eq!(anthropic_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_primary_failures_do_not_retry() {
    let (openai, openai_calls) = MockClient::replying("mock-gpt", "hi");
    let (anthropic, anthropic_calls) = MockClient::failing("mock-claude");
    let gateway = mock_gateway(vec![
        (Provider::OpenAi, openai),
        (Provider::Anthropic, anthropic),
    ]);

    let result = gateway
        .generate(Provider::Anthropic, "嗨", &GenerateOptions::default())
        .await;

    assert!(result.is_err());
    assert_eq!(anthropic_calls.load(Ordering::SeqCst), 1);
    assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn health_checks_update_the_map_used_by_resolve() {
    let (openai, _) = MockClient::failing("mock-gpt");
    let (anthropic, _) = MockClient::replying("mock-claude", "ok");
    let gateway = mock_gateway(vec![
        (Provider::OpenAi, openai),
        (Provider::Anthropic, anthropic),
    ]);

    let report = gateway.check_all().await;
    assert!(!report[&Provider::OpenAi].healthy);
    assert!(report[&Provider::Anthropic].healthy);

    // The failed probe now steers resolution away from openai.
    assert_eq!(gateway.resolve(Provider::OpenAi).await.unwrap(), Provider::Anthropic);
}
