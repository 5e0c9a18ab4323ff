use serde::{ Serialize, Deserialize };

/// Body of `POST /api/chat`.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Base64 encoded WebM recording.
    #[serde(default)]
    pub audio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Text,
    Audio,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub message: String,
    pub input_method: InputMethod,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: None, message: message.into() }
    }

    pub fn with_error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: Some(error.into()), message: message.into() }
    }
}
