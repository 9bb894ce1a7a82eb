#![allow(dead_code)]

use async_trait::async_trait;
use ducktherapy::client_wrapper::{ClientError, ClientWrapper, GenerateOptions, Provider};
use ducktherapy::config::{ConfigStore, Settings};
use ducktherapy::gateway::LlmGateway;
use ducktherapy::registry::AgentRegistry;
use ducktherapy::session::SessionStore;
use ducktherapy::workflow::WorkflowEngine;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Canned-response backend with an invocation counter, so tests can assert
/// not just what came back but whether the gateway was consulted at all.
pub struct MockClient {
    model: String,
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockClient {
    pub fn replying(model: &str, reply: &str) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Arc::new(MockClient {
            model: model.to_string(),
            reply: Some(reply.to_string()),
            calls: Arc::clone(&calls),
        });
        (client, calls)
    }

    pub fn failing(model: &str) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Arc::new(MockClient {
            model: model.to_string(),
            reply: None,
            calls: Arc::clone(&calls),
        });
        (client, calls)
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err("mock backend down".into()),
        }
    }
}

/// Settings that never reach a real endpoint: no hosted credentials, and the
/// Ollama default is removed from the gateways built below.
pub fn test_settings() -> Settings {
    Settings {
        primary_provider: Provider::OpenAi,
        fallback_provider: Provider::Anthropic,
        enable_fallback: true,
        request_timeout_secs: 5,
        ..Settings::default()
    }
}

/// A gateway holding exactly the given mock clients.
pub fn mock_gateway(clients: Vec<(Provider, Arc<dyn ClientWrapper>)>) -> LlmGateway {
    let mut gateway = LlmGateway::new(test_settings()).without_provider(Provider::Ollama);
    for (provider, client) in clients {
        gateway = gateway.with_client(provider, client);
    }
    gateway
}

/// Full engine wired to a single mock client on the primary provider.
pub fn mock_engine(client: Arc<dyn ClientWrapper>) -> (Arc<WorkflowEngine>, Arc<SessionStore>) {
    let config = Arc::new(ConfigStore::builtin(test_settings()));
    let gateway = Arc::new(mock_gateway(vec![(Provider::OpenAi, client)]));
    let sessions = Arc::new(SessionStore::new());
    let engine = WorkflowEngine::new(config, gateway, Arc::clone(&sessions))
        .expect("builtin config must build");
    (Arc::new(engine), sessions)
}

/// Like [`mock_engine`], but with registry overrides applied before the
/// engine is assembled.
pub fn mock_engine_with(
    client: Arc<dyn ClientWrapper>,
    overrides: Vec<Arc<dyn ducktherapy::agent::TherapyAgent>>,
) -> (Arc<WorkflowEngine>, Arc<SessionStore>) {
    let config = Arc::new(ConfigStore::builtin(test_settings()));
    let gateway = Arc::new(mock_gateway(vec![(Provider::OpenAi, client)]));
    let sessions = Arc::new(SessionStore::new());
    let mut registry =
        AgentRegistry::from_config(&config, &gateway).expect("builtin config must build");
    for agent in overrides {
        registry.insert(agent);
    }
    let engine = WorkflowEngine::with_registry(registry, config, gateway, Arc::clone(&sessions));
    (Arc::new(engine), sessions)
}
