//! Concrete [`ClientWrapper`](crate::client_wrapper::ClientWrapper)
//! implementations for the supported providers.

pub mod anthropic;
mod common;
pub mod ollama;
pub mod openai;
