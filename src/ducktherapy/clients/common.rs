use crate::client_wrapper::{ClientError, GenerateOptions};
use lazy_static::lazy_static;
use openai_rust::chat;
use openai_rust2 as openai_rust;

lazy_static! {
    /// Shared connection pool for everything that talks raw HTTP (Ollama and
    /// its health probe).  The openai-rust2 clients manage their own pool.
    pub(crate) static ref HTTP_CLIENT: reqwest::Client = reqwest::Client::new();
}

/// Send a single-turn chat request and return the assistant's content.
pub async fn send_chat(
    api: &openai_rust::Client,
    model: &str,
    prompt: &str,
    options: &GenerateOptions,
    url_path: Option<String>,
) -> Result<String, ClientError> {
    let mut formatted_msgs = Vec::with_capacity(2);
    if let Some(system) = &options.system_prompt {
        formatted_msgs.push(chat::Message {
            role: "system".to_owned(),
            content: system.clone(),
        });
    }
    formatted_msgs.push(chat::Message {
        role: "user".to_owned(),
        content: prompt.to_owned(),
    });

    let chat_arguments = chat::ChatArguments::new(model, formatted_msgs);

    match api.create_chat(chat_arguments, url_path).await {
        Ok(response) => {
            if response.choices.is_empty() {
                return Err("chat completion contained no choices".into());
            }
            Ok(response.choices[0].message.content.clone())
        }
        Err(err) => {
            log::error!(
                "ducktherapy::clients::common::send_chat({}): API error: {}",
                model,
                err
            );
            Err(err.into())
        }
    }
}
