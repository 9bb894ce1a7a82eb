//! Provider identifiers and the client trait every LLM backend implements.
//!
//! The [`ClientWrapper`] trait is the seam between the gateway and concrete
//! backends (OpenAI, Anthropic, Ollama, or anything custom such as the mock
//! clients used in the integration tests).  Implementations turn a single
//! prompt into a single completion; conversation state, fallback and health
//! bookkeeping all live in [`LlmGateway`](crate::ducktherapy::gateway::LlmGateway).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// The LLM providers the gateway knows how to route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Ollama,
}

impl Provider {
    /// Fixed fallback chain consulted when this provider is unhealthy or not
    /// configured.  Order matters: earlier entries are tried first.
    pub fn fallback_chain(self) -> [Provider; 2] {
        match self {
            Provider::OpenAi => [Provider::Anthropic, Provider::Ollama],
            Provider::Anthropic => [Provider::OpenAi, Provider::Ollama],
            Provider::Ollama => [Provider::OpenAi, Provider::Anthropic],
        }
    }

    /// Every provider the gateway can ever register, in a stable order.
    pub fn all() -> [Provider; 3] {
        [Provider::OpenAi, Provider::Anthropic, Provider::Ollama]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "ollama" => Ok(Provider::Ollama),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Per-request knobs passed through to the backend.
///
/// Hosted OpenAI-compatible endpoints are called with their server-side
/// defaults; the Ollama client honours `temperature` and `max_tokens` through
/// its request options.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Optional system prompt sent ahead of the user prompt.
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Error type produced by concrete clients.  The gateway wraps these into
/// [`GatewayError`](crate::ducktherapy::gateway::GatewayError) with provider
/// attribution attached.
pub type ClientError = Box<dyn Error + Send + Sync>;

/// A single-turn completion backend.
///
/// ```rust,no_run
/// use ducktherapy::client_wrapper::{ClientWrapper, GenerateOptions};
/// use ducktherapy::clients::ollama::OllamaClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let client = OllamaClient::new("http://localhost:11434", "qwen2.5:7b");
///     let reply = client.generate("你好呀", &GenerateOptions::default()).await?;
///     println!("{}", reply);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Model identifier injected into each request.
    fn model(&self) -> &str;

    /// Produce a completion for `prompt`.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ClientError>;

    /// Cheap liveness probe.  The default implementation performs a minimal
    /// generation and treats an empty reply as a failure; clients with a
    /// dedicated health endpoint (Ollama) override this.
    async fn check_health(&self) -> Result<(), ClientError> {
        let options = GenerateOptions {
            max_tokens: Some(8),
            ..GenerateOptions::default()
        };
        let reply = self.generate("Hello", &options).await?;
        if reply.trim().is_empty() {
            return Err("health probe returned an empty completion".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_from_str() {
        for provider in Provider::all().iter() {
            assert_eq!(provider.to_string().parse::<Provider>().unwrap(), *provider);
        }
    }

    #[test]
    fn fallback_chains_never_contain_self() {
        for provider in Provider::all().iter() {
            assert!(!provider.fallback_chain().contains(provider));
        }
    }
}
