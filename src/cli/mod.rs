use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:5000")]
    pub server_addr: String,

    /// Largest accepted request body in bytes (recorded audio arrives base64 encoded).
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "16777216")]
    pub max_body_bytes: usize,

    // --- Chat LLM Args ---
    /// Google API key used for Gemini (and for speech recognition unless SPEECH_API_KEY is set).
    #[arg(long, env = "GOOGLE_API_KEY", default_value = "", hide_env_values = true)]
    pub google_api_key: String,

    /// Gemini model name for chat completion (e.g., gemini-1.5-flash, gemini-1.5-pro)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Base URL for the Gemini API (e.g., https://generativelanguage.googleapis.com/v1beta)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// Seconds a Gemini call may take before it fails as a generation error.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "60")]
    pub chat_timeout_secs: u64,

    /// Number of turns kept as conversation context.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "10")]
    pub history_limit: usize,

    // --- Speech Args ---
    /// API key for Google Speech-to-Text. Defaults to GOOGLE_API_KEY if not set.
    #[arg(long, env = "SPEECH_API_KEY", hide_env_values = true)]
    pub speech_api_key: Option<String>,

    /// Base URL for the Google Speech-to-Text API.
    #[arg(long, env = "SPEECH_BASE_URL")]
    pub speech_base_url: Option<String>,

    /// BCP-47 language code passed to speech recognition.
    #[arg(long, env = "SPEECH_LANGUAGE", default_value = "en-US")]
    pub speech_language: String,

    /// Seconds a speech recognition call may take.
    #[arg(long, env = "SPEECH_TIMEOUT_SECS", default_value = "30")]
    pub speech_timeout_secs: u64,

    /// ffmpeg binary used to transcode recorded audio to PCM.
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg_path: String,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn speech_key(&self) -> String {
        match &self.speech_api_key {
            Some(k) if !k.trim().is_empty() => k.clone(),
            _ => self.google_api_key.clone(),
        }
    }
}
