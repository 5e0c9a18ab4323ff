use crate::error::AgentError;
use crate::history::ConversationBuffer;
use crate::llm::chat::ChatClient;
use crate::models::api::{ ChatRequest, ChatResponse, InputMethod };
use crate::models::chat::Turn;
use crate::speech::SpeechToText;

use log::{ debug, info, warn, error };
use std::sync::Arc;
use std::ops::{ Deref, DerefMut };
use tokio::sync::{ Mutex, MutexGuard };

/// Runs one chat request end to end against the shared conversation history.
pub struct ChatAgent {
    chat_client: Option<Arc<dyn ChatClient>>,
    transcriber: Arc<dyn SpeechToText>,
    history: Mutex<ConversationBuffer>,
}

impl ChatAgent {
    /// `chat_client` is `None` when the model failed to initialize at startup;
    /// requests then fail with [`AgentError::ModelNotInitialized`].
    pub fn new(
        chat_client: Option<Arc<dyn ChatClient>>,
        transcriber: Arc<dyn SpeechToText>,
        max_turns: usize
    ) -> Self {
        Self {
            chat_client,
            transcriber,
            history: Mutex::new(ConversationBuffer::new(max_turns)),
        }
    }

    pub fn is_model_ready(&self) -> bool {
        self.chat_client.is_some()
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.history.lock().await.snapshot()
    }

    pub async fn process_message(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let audio = request.audio.filter(|a| !a.is_empty());
        let mut message = request.message.unwrap_or_default();

        let input_method = match audio {
            Some(ref audio) => {
                info!("Received audio payload ({} base64 chars)", audio.len());
                message = self.transcriber
                    .transcribe(audio).await
                    .ok_or(AgentError::SpeechNotRecognized)?;
                info!("Recognized speech: {}", message);
                InputMethod::Audio
            }
            None => InputMethod::Text,
        };

        if message.is_empty() {
            warn!("Rejected request with no message or audio");
            return Err(AgentError::NoMessage);
        }

        let chat_client = self.chat_client.as_ref().ok_or_else(|| {
            error!("Chat request received but the AI model is not initialized");
            AgentError::ModelNotInitialized
        })?;

        // Held until the model turn lands so concurrent requests cannot split
        // a user/model pair.
        let mut history = TrimOnRelease(self.history.lock().await);
        let context = history.snapshot();
        history.append(Turn::user(message.as_str()));

        let reply = match chat_client.complete(&context, &message).await {
            Ok(resp) => resp.response,
            Err(e) => {
                error!("Generative AI Error: {}", e);
                // The unanswered user turn stays in the history.
                return Err(AgentError::Generation(e));
            }
        };

        history.append(Turn::model(reply.as_str()));
        drop(history);

        info!("Generated response: {}", reply);
        Ok(ChatResponse { message: reply, input_method })
    }
}

/// History lock that trims the buffer before unlocking, including when the
/// request future is dropped mid-generation.
struct TrimOnRelease<'a>(MutexGuard<'a, ConversationBuffer>);

impl Deref for TrimOnRelease<'_> {
    type Target = ConversationBuffer;

    fn deref(&self) -> &ConversationBuffer {
        &self.0
    }
}

impl DerefMut for TrimOnRelease<'_> {
    fn deref_mut(&mut self) -> &mut ConversationBuffer {
        &mut self.0
    }
}

impl Drop for TrimOnRelease<'_> {
    fn drop(&mut self) {
        self.0.trim();
        debug!("History holds {} of {} turn(s)", self.0.len(), self.0.max_turns());
    }
}
