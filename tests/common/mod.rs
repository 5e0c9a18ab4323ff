//! Shared fakes for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use gemini_voice_relay::agent::ChatAgent;
use gemini_voice_relay::llm::LlmError;
use gemini_voice_relay::llm::chat::{ ChatClient, CompletionResponse };
use gemini_voice_relay::models::chat::Turn;
use gemini_voice_relay::speech::SpeechToText;
use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Replies with `echo: <message>` and records every call it receives.
#[derive(Default)]
pub struct FakeChatClient {
    calls: Mutex<Vec<(Vec<Turn>, String)>>,
    failing: AtomicBool,
    held: AtomicBool,
    gate: Notify,
}

impl FakeChatClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let client = Self::new();
        client.set_failing(true);
        client
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes the next calls wait inside `complete` until [`Self::release`].
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<(Vec<Turn>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn complete(
        &self,
        history: &[Turn],
        message: &str
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push((history.to_vec(), message.to_string()));
        // Give concurrent requests a chance to interleave.
        tokio::task::yield_now().await;
        if self.held.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Api {
                status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                body: "quota exhausted".into(),
            });
        }
        Ok(CompletionResponse { response: format!("echo: {}", message) })
    }

    fn get_model(&self) -> String {
        "fake-model".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

/// Returns a fixed transcript (or nothing) for any audio payload.
pub struct FakeTranscriber {
    transcript: Option<String>,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn recognizing(text: &str) -> Arc<Self> {
        Arc::new(Self { transcript: Some(text.to_string()), calls: AtomicUsize::new(0) })
    }

    pub fn deaf() -> Arc<Self> {
        Arc::new(Self { transcript: None, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for FakeTranscriber {
    async fn transcribe(&self, _base64_audio: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcript.clone()
    }
}

pub fn agent_with(
    chat: Option<Arc<FakeChatClient>>,
    transcriber: Arc<FakeTranscriber>
) -> Arc<ChatAgent> {
    let chat = chat.map(|c| c as Arc<dyn ChatClient>);
    Arc::new(ChatAgent::new(chat, transcriber, 10))
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_mock(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
