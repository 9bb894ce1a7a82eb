mod common;

use async_trait::async_trait;
use common::{mock_engine, mock_engine_with, MockClient};
use ducktherapy::agent::{AgentContext, AgentError, AgentOutcome, TherapyAgent};
use ducktherapy::client_wrapper::Provider;
use ducktherapy::health::HealthStatus;
use serde_json::Value;
use std::sync::Arc;

struct SickAgent;

#[async_trait]
impl TherapyAgent for SickAgent {
    fn name(&self) -> &str {
        "sick_agent"
    }

    async fn process(&self, _ctx: &AgentContext, _input: &Value) -> Result<AgentOutcome, AgentError> {
        Err(AgentError::BadModelOutput("permanently broken".to_string()))
    }
}

#[tokio::test]
async fn a_working_backend_yields_a_healthy_system() {
    let (client, _) = MockClient::replying("mock-gpt", "我在呢");
    let (engine, _) = mock_engine(client);

    let health = engine.system_health().await;

    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.agents.len(), 4);
    assert!(health.agents.values().all(|agent| agent.healthy));
    assert!(health.providers[&Provider::OpenAi].healthy);
}

#[tokio::test]
async fn one_broken_agent_degrades_the_system() {
    let (client, _) = MockClient::replying("mock-gpt", "我在呢");
    let (engine, _) = mock_engine_with(client, vec![Arc::new(SickAgent)]);

    let health = engine.system_health().await;

    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(!health.agents["sick_agent"].healthy);
    assert!(health.agents["sick_agent"].error.is_some());
    assert!(health.agents.values().filter(|agent| agent.healthy).count() >= 4);
}

#[tokio::test]
async fn a_dead_provider_is_reported_without_sinking_the_agents() {
    // Every builtin agent survives a dead gateway on its own fallback, so
    // the provider reading goes red while the agent readings stay green.
    let (client, _) = MockClient::failing("mock-gpt");
    let (engine, _) = mock_engine(client);

    let health = engine.system_health().await;

    assert_eq!(health.status, HealthStatus::Healthy);
    let provider = &health.providers[&Provider::OpenAi];
    assert!(!provider.healthy);
    assert!(provider.detail.is_some());
}
