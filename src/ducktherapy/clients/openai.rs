//! OpenAI chat completions backend.

use crate::client_wrapper::{ClientError, ClientWrapper, GenerateOptions};
use crate::clients::common::send_chat;
use async_trait::async_trait;
use log::error;
use openai_rust2 as openai_rust;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Client wrapper for OpenAI's Chat Completions API, also usable against any
/// OpenAI-compatible deployment via [`OpenAiClient::new_with_base_url`].
pub struct OpenAiClient {
    client: openai_rust::Client,
    model: String,
}

impl OpenAiClient {
    pub fn new(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAiClient {
            client: openai_rust::Client::new_with_base_url(secret_key, base_url),
            model: model_name.to_string(),
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ClientError> {
        let url_path = Some("/v1/chat/completions".to_string());
        match send_chat(&self.client, &self.model, prompt, options, url_path).await {
            Ok(content) => Ok(content),
            Err(err) => {
                error!("OpenAiClient::generate({}): {}", self.model, err);
                Err(err)
            }
        }
    }
}
