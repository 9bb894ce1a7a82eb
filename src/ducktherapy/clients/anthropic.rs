//! Anthropic backend, driven through Anthropic's OpenAI-compatible endpoint.
//!
//! Anthropic exposes a chat-completions shim at `https://api.anthropic.com/v1`,
//! so this client simply delegates to [`OpenAiClient`] pointed at that base
//! URL rather than reimplementing the wire format.

use crate::client_wrapper::{ClientError, ClientWrapper, GenerateOptions};
use crate::clients::openai::OpenAiClient;
use async_trait::async_trait;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

pub struct AnthropicClient {
    delegate: OpenAiClient,
}

impl AnthropicClient {
    pub fn new(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, ANTHROPIC_BASE_URL)
    }

    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        AnthropicClient {
            delegate: OpenAiClient::new_with_base_url(secret_key, model_name, base_url),
        }
    }
}

#[async_trait]
impl ClientWrapper for AnthropicClient {
    fn model(&self) -> &str {
        self.delegate.model()
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ClientError> {
        self.delegate.generate(prompt, options).await
    }
}
