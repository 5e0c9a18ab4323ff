pub mod google;
pub mod transcode;

use async_trait::async_trait;
use base64::{ engine::general_purpose::STANDARD as BASE64, Engine };
use log::{ debug, error };
use std::sync::Arc;
use thiserror::Error;

use self::transcode::FfmpegTranscoder;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech configuration error: {0}")]
    Config(String),

    #[error("invalid base64 audio: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("transcoding failed: {0}")]
    Transcode(String),

    #[error("unsupported audio format: {0}")]
    Format(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no speech recognized")]
    NoSpeech,
}

/// Turns a base64 recording into text. Every failure collapses to `None`.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, base64_audio: &str) -> Option<String>;
}

/// External recognizer fed with WAV-wrapped linear PCM.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, wav: &[u8]) -> Result<String, SpeechError>;
}

/// Accepts either bare base64 or a `data:<mime>;base64,` URL.
pub fn decode_audio(base64_audio: &str) -> Result<Vec<u8>, SpeechError> {
    let trimmed = base64_audio.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => trimmed,
    };
    Ok(BASE64.decode(payload)?)
}

pub struct AudioTranscriber {
    transcoder: FfmpegTranscoder,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl AudioTranscriber {
    pub fn new(transcoder: FfmpegTranscoder, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { transcoder, recognizer }
    }

    pub async fn try_transcribe(&self, base64_audio: &str) -> Result<String, SpeechError> {
        let container = decode_audio(base64_audio)?;
        debug!("Decoded {} bytes of audio", container.len());
        let wav = self.transcoder.to_wav(&container).await?;
        let text = self.recognizer.recognize(&wav).await?;
        if text.trim().is_empty() {
            return Err(SpeechError::NoSpeech);
        }
        Ok(text)
    }
}

#[async_trait]
impl SpeechToText for AudioTranscriber {
    async fn transcribe(&self, base64_audio: &str) -> Option<String> {
        match self.try_transcribe(base64_audio).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Speech recognition error: {}", e);
                None
            }
        }
    }
}
