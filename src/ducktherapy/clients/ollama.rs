//! Ollama backend over its native REST API.
//!
//! Generation goes through `POST /api/generate` with `stream: false`; health
//! checks hit `GET /api/tags` (the model listing) instead of burning a
//! completion, so both share one base URL.

use crate::client_wrapper::{ClientError, ClientWrapper, GenerateOptions};
use crate::clients::common::HTTP_CLIENT;
use async_trait::async_trait;
use log::error;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaClient {
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model_name: &str) -> Self {
        OllamaClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
        }
    }

    pub fn new_local(model_name: &str) -> Self {
        Self::new(DEFAULT_BASE_URL, model_name)
    }
}

#[async_trait]
impl ClientWrapper for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ClientError> {
        let mut request_options = serde_json::Map::new();
        if let Some(temperature) = options.temperature {
            request_options.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            request_options.insert("num_predict".to_string(), json!(max_tokens));
        }

        let full_prompt = match &options.system_prompt {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };

        let body = json!({
            "model": self.model,
            "prompt": full_prompt,
            "stream": false,
            "options": request_options,
        });

        let result = HTTP_CLIENT
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(response) => {
                let parsed: GenerateResponse = response.json().await?;
                Ok(parsed.response)
            }
            Err(err) => {
                error!("OllamaClient::generate({}): {}", self.model, err);
                Err(err.into())
            }
        }
    }

    async fn check_health(&self) -> Result<(), ClientError> {
        HTTP_CLIENT
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
