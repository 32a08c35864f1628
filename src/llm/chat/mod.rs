pub mod gemini;

use async_trait::async_trait;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error as ThisError;
use self::gemini::GeminiChatClient;
use super::LlmConfig;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub response: String,
}

/// Why a completion produced no reply.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CompletionError {
    /// The service answered with a non-success status.
    #[error("completion service rejected the request: {0}")]
    RemoteRejected(String),
    /// The request never completed or the reply could not be decoded.
    #[error("completion transport failure: {0}")]
    TransportError(String),
}

/// One stateless request/response exchange per call. No history is sent.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, CompletionError>;

    fn get_model(&self) -> String;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
