//! Multi-provider LLM gateway.
//!
//! The gateway owns one [`ClientWrapper`] per configured provider plus a
//! health map, and routes every generation through two distinct fallback
//! strategies:
//!
//! 1. **Resolution (chain walk)** — before dispatch, [`LlmGateway::resolve`]
//!    replaces an unhealthy or unconfigured provider with the first healthy
//!    entry of its fixed fallback chain.
//! 2. **Retry (single hop)** — after a failed dispatch,
//!    [`LlmGateway::generate`] retries exactly once against the configured
//!    fallback provider, and only when the failing provider was the
//!    configured primary.
//!
//! Successful generations carry their provider and model identifiers so
//! downstream results can attribute the call without guessing.

use crate::client_wrapper::{ClientWrapper, GenerateOptions, Provider};
use crate::clients::anthropic::AnthropicClient;
use crate::clients::ollama::OllamaClient;
use crate::clients::openai::OpenAiClient;
use crate::config::Settings;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;

/// Upper bound for a single health probe.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum GatewayError {
    /// Neither the requested provider nor anything on its fallback chain is
    /// registered and healthy.
    NoProviderAvailable(Provider),
    ProviderNotConfigured(Provider),
    Timeout { provider: Provider, after: Duration },
    Provider { provider: Provider, message: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::NoProviderAvailable(requested) => {
                write!(f, "no healthy provider available (requested {})", requested)
            }
            GatewayError::ProviderNotConfigured(provider) => {
                write!(f, "provider not configured: {}", provider)
            }
            GatewayError::Timeout { provider, after } => {
                write!(f, "provider {} timed out after {:?}", provider, after)
            }
            GatewayError::Provider { provider, message } => {
                write!(f, "provider {} failed: {}", provider, message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// A successful completion with explicit attribution.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub provider: Provider,
    pub model: String,
}

/// Outcome of one provider health probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub provider: Provider,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Routes generations across the configured providers.
pub struct LlmGateway {
    settings: Settings,
    clients: HashMap<Provider, Arc<dyn ClientWrapper>>,
    health: RwLock<HashMap<Provider, bool>>,
}

impl LlmGateway {
    /// Build a gateway from settings.  Hosted providers are registered only
    /// when credentials are present; Ollama is always registered.
    pub fn new(settings: Settings) -> Self {
        let mut clients: HashMap<Provider, Arc<dyn ClientWrapper>> = HashMap::new();

        if let Some(openai) = &settings.openai {
            let client = match &openai.base_url {
                Some(base) => OpenAiClient::new_with_base_url(&openai.api_key, &openai.model, base),
                None => OpenAiClient::new(&openai.api_key, &openai.model),
            };
            clients.insert(Provider::OpenAi, Arc::new(client));
        }
        if let Some(anthropic) = &settings.anthropic {
            let client = match &anthropic.base_url {
                Some(base) => {
                    AnthropicClient::new_with_base_url(&anthropic.api_key, &anthropic.model, base)
                }
                None => AnthropicClient::new(&anthropic.api_key, &anthropic.model),
            };
            clients.insert(Provider::Anthropic, Arc::new(client));
        }
        clients.insert(
            Provider::Ollama,
            Arc::new(OllamaClient::new(&settings.ollama.base_url, &settings.ollama.model)),
        );

        info!(
            "gateway initialised with providers: {}",
            clients.keys().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
        );

        LlmGateway {
            settings,
            clients,
            health: RwLock::new(HashMap::new()),
        }
    }

    /// Replace or register a client for `provider`.  This is the seam the
    /// integration tests use to install mock backends.
    pub fn with_client(mut self, provider: Provider, client: Arc<dyn ClientWrapper>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    /// Remove a provider entirely (useful for simulating sparse deployments).
    pub fn without_provider(mut self, provider: Provider) -> Self {
        self.clients.remove(&provider);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.clients.keys().copied().collect()
    }

    async fn is_available(&self, provider: Provider) -> bool {
        if !self.clients.contains_key(&provider) {
            return false;
        }
        // Providers are optimistic until a probe says otherwise.
        *self.health.read().await.get(&provider).unwrap_or(&true)
    }

    /// Strategy 1: pick the provider to dispatch to.  Returns `requested`
    /// when it is registered and healthy, otherwise walks its fallback chain.
    pub async fn resolve(&self, requested: Provider) -> Result<Provider, GatewayError> {
        if self.is_available(requested).await {
            return Ok(requested);
        }
        if self.settings.enable_fallback {
            for candidate in requested.fallback_chain().iter() {
                if self.is_available(*candidate).await {
                    info!("provider {} unavailable, resolved to {}", requested, candidate);
                    return Ok(*candidate);
                }
            }
        }
        Err(GatewayError::NoProviderAvailable(requested))
    }

    async fn dispatch(
        &self,
        provider: Provider,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, GatewayError> {
        let client = self
            .clients
            .get(&provider)
            .ok_or(GatewayError::ProviderNotConfigured(provider))?;
        let budget = Duration::from_secs(self.settings.request_timeout_secs);

        match timeout(budget, client.generate(prompt, options)).await {
            Ok(Ok(text)) => {
                debug!("provider {} answered ({} chars)", provider, text.chars().count());
                Ok(Generation {
                    text,
                    provider,
                    model: client.model().to_string(),
                })
            }
            Ok(Err(err)) => Err(GatewayError::Provider {
                provider,
                message: err.to_string(),
            }),
            Err(_) => Err(GatewayError::Timeout {
                provider,
                after: budget,
            }),
        }
    }

    /// Generate a completion, applying both fallback strategies.
    pub async fn generate(
        &self,
        requested: Provider,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Generation, GatewayError> {
        let resolved = self.resolve(requested).await?;

        match self.dispatch(resolved, prompt, options).await {
            Ok(generation) => Ok(generation),
            Err(err) => {
                warn!("generation via {} failed: {}", resolved, err);
                // Strategy 2: one retry against the configured fallback, and
                // only when the primary itself just failed.
                let fallback = self.settings.fallback_provider;
                if self.settings.enable_fallback
                    && resolved == self.settings.primary_provider
                    && fallback != resolved
                    && self.clients.contains_key(&fallback)
                {
                    info!("retrying once via fallback provider {}", fallback);
                    self.dispatch(fallback, prompt, options).await
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Probe one provider and record the outcome in the health map.
    pub async fn check_health(&self, provider: Provider) -> ProviderHealth {
        let started = Instant::now();
        let outcome = match self.clients.get(&provider) {
            None => Err("provider not configured".to_string()),
            Some(client) => match timeout(HEALTH_CHECK_TIMEOUT, client.check_health()).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(err.to_string()),
                Err(_) => Err(format!("health probe timed out after {:?}", HEALTH_CHECK_TIMEOUT)),
            },
        };

        let healthy = outcome.is_ok();
        self.health.write().await.insert(provider, healthy);
        if !healthy {
            warn!("provider {} is unhealthy: {:?}", provider, outcome.as_ref().err());
        }

        ProviderHealth {
            provider,
            healthy,
            latency_ms: started.elapsed().as_millis() as u64,
            detail: outcome.err(),
            checked_at: Utc::now(),
        }
    }

    /// Probe every registered provider in parallel.
    pub async fn check_all(&self) -> HashMap<Provider, ProviderHealth> {
        let providers = self.providers();
        let probes = providers.iter().map(|p| self.check_health(*p));
        join_all(probes)
            .await
            .into_iter()
            .map(|health| (health.provider, health))
            .collect()
    }

    /// Force a provider's health flag.  Test hook; production code only
    /// updates health through probes.
    pub async fn set_health(&self, provider: Provider, healthy: bool) {
        self.health.write().await.insert(provider, healthy);
    }
}
