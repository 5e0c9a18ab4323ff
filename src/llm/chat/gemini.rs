use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use log::{ debug, info, error };
use std::time::Duration;

use super::{ ChatClient, CompletionResponse };
use crate::llm::{
    LlmConfig,
    LlmError,
    DEFAULT_CHAT_TIMEOUT,
    DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL,
};
use crate::models::chat::{ Role, Turn };

#[derive(Serialize, Debug)]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize, Debug)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GooglePromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize, Debug)]
struct GooglePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GooglePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn build_request<'a>(history: &'a [Turn], message: &'a str) -> GenerateContentRequest<'a> {
    let mut contents: Vec<GeminiContent<'a>> = history
        .iter()
        .map(|turn| GeminiContent {
            role: turn.role().as_str(),
            parts: vec![GeminiPart { text: turn.text() }],
        })
        .collect();
    contents.push(GeminiContent {
        role: Role::User.as_str(),
        parts: vec![GeminiPart { text: message }],
    });
    GenerateContentRequest { contents }
}

fn extract_text(resp: GenerateContentResponse) -> Result<String, LlmError> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = resp.prompt_feedback.and_then(|f| f.block_reason);
        return Err(LlmError::EmptyResponse(reason));
    };

    let text: String = candidate.content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse(candidate.finish_reason));
    }
    Ok(text)
}

pub struct GeminiChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("Google API key is required for GeminiChatClient".into()));
        }

        let chat_model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let chat_model = chat_model.trim_start_matches("models/").to_string();

        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::Config(format!("Invalid Gemini base URL '{}': {}", base_url, e)))?;

        let http = HttpClient::builder().timeout(DEFAULT_CHAT_TIMEOUT).build()?;

        Ok(Self {
            http,
            api_key,
            model: chat_model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| LlmError::Config("Google API key is required for GeminiChatClient".into()))?;

        let client = Self::new(api_key, config.completion_model.clone(), config.base_url.clone())?;
        match config.timeout {
            Some(timeout) => client.with_timeout(timeout),
            None => Ok(client),
        }
    }

    /// Replaces the default request timeout. The history lock is held for the
    /// whole generation call, so this bounds how long one stalled upstream
    /// connection can stall every other chat request.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.http = HttpClient::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(
        &self,
        history: &[Turn],
        message: &str
    ) -> Result<CompletionResponse, LlmError> {
        info!(
            "GeminiChatClient::complete() → model={} context_turns={}",
            self.model,
            history.len()
        );
        let payload = build_request(history, message);

        let resp = self.http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, body);
            return Err(LlmError::Api { status, body });
        }

        let data = resp.json::<GenerateContentResponse>().await?;
        let text = extract_text(data)?;
        debug!("Gemini returned {} chars", text.len());
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
