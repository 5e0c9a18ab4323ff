use super::{ SpeechError, SpeechRecognizer };
use async_trait::async_trait;
use base64::{ engine::general_purpose::STANDARD as BASE64, Engine };
use hound::{ SampleFormat, WavReader };
use log::{ debug, error, info };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::io::Cursor;
use std::time::Duration;

pub const DEFAULT_SPEECH_BASE_URL: &str = "https://speech.googleapis.com/v1";
pub const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";
pub const DEFAULT_SPEECH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    audio_channel_count: u16,
    language_code: &'a str,
}

#[derive(Serialize, Debug)]
struct RecognitionAudio {
    content: String,
}

#[derive(Serialize, Debug)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Deserialize, Debug, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechRecognitionResult>,
}

#[derive(Deserialize, Debug)]
struct SpeechRecognitionResult {
    #[serde(default)]
    alternatives: Vec<SpeechRecognitionAlternative>,
}

#[derive(Deserialize, Debug)]
struct SpeechRecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

/// Top alternative of every result, in order.
fn best_transcript(resp: RecognizeResponse) -> String {
    resp.results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Google Cloud Speech-to-Text `speech:recognize` over REST, LINEAR16 input.
pub struct GoogleSpeechClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    language: String,
}

impl GoogleSpeechClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        language: Option<String>
    ) -> Result<Self, SpeechError> {
        if api_key.trim().is_empty() {
            return Err(SpeechError::Config("Google API key is required for speech recognition".into()));
        }
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SPEECH_BASE_URL.to_string());
        reqwest::Url::parse(&base_url)
            .map_err(|e| SpeechError::Config(format!("Invalid speech base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            http: HttpClient::builder().timeout(DEFAULT_SPEECH_TIMEOUT).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SPEECH_LANGUAGE.to_string()),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SpeechError> {
        self.http = HttpClient::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn build_request<'a>(&'a self, wav: &[u8]) -> Result<RecognizeRequest<'a>, SpeechError> {
        let spec = WavReader::new(Cursor::new(wav))?.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
            return Err(SpeechError::Format(format!(
                "expected 16-bit integer PCM, got {}-bit {:?}",
                spec.bits_per_sample,
                spec.sample_format
            )));
        }

        Ok(RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: spec.sample_rate,
                audio_channel_count: spec.channels,
                language_code: &self.language,
            },
            audio: RecognitionAudio { content: BASE64.encode(wav) },
        })
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(&self, wav: &[u8]) -> Result<String, SpeechError> {
        let payload = self.build_request(wav)?;
        debug!(
            "Sending {} bytes of LINEAR16 audio ({} Hz, lang={}) to Google Speech",
            wav.len(),
            payload.config.sample_rate_hertz,
            self.language
        );

        let resp = self.http
            .post(format!("{}/speech:recognize", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Google Speech API error {}: {}", status, body);
            return Err(SpeechError::Api { status, body });
        }

        let transcript = best_transcript(resp.json::<RecognizeResponse>().await?);
        if transcript.is_empty() {
            return Err(SpeechError::NoSpeech);
        }
        info!("Transcription complete: {}", transcript);
        Ok(transcript)
    }
}
