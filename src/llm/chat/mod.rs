pub mod gemini;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use super::{ LlmConfig, LlmError };
use crate::models::chat::Turn;
use self::gemini::GeminiChatClient;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

/// A hosted text generation backend.
///
/// `history` holds the turns that precede `message`; implementations send
/// both and return only the newly generated reply.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        history: &[Turn],
        message: &str
    ) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = Arc::new(GeminiChatClient::from_config(config)?);
    Ok(client)
}
