pub mod agent;
pub mod cli;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;
pub mod speech;

use agent::ChatAgent;
use cli::Args;
use llm::LlmConfig;
use llm::chat::{ ChatClient, new_client as new_chat_client };
use log::{ info, warn, error };
use server::Server;
use speech::{ AudioTranscriber, SpeechRecognizer, SpeechToText };
use speech::google::GoogleSpeechClient;
use speech::transcode::FfmpegTranscoder;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// Builds the Gemini client. A failure here is logged rather than returned:
/// the server still starts and answers chat requests with "model not initialized".
pub fn initialize_chat_client(args: &Args) -> Option<Arc<dyn ChatClient>> {
    let config = LlmConfig {
        api_key: Some(args.google_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        timeout: Some(Duration::from_secs(args.chat_timeout_secs)),
    };

    match new_chat_client(&config) {
        Ok(client) => {
            info!(
                "Gemini model initialized successfully: Model={}, BaseURL={}",
                client.get_model(),
                client.get_base_url().as_deref().unwrap_or("adapter default")
            );
            Some(client)
        }
        Err(e) => {
            error!("Failed to initialize Gemini model: {}", e);
            None
        }
    }
}

pub fn initialize_transcriber(
    args: &Args
) -> Result<Arc<dyn SpeechToText>, Box<dyn Error + Send + Sync>> {
    let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(
        GoogleSpeechClient::new(
            args.speech_key(),
            args.speech_base_url.clone(),
            Some(args.speech_language.clone())
        )?.with_timeout(Duration::from_secs(args.speech_timeout_secs))?
    );
    let transcoder = FfmpegTranscoder::new(args.ffmpeg_path.clone());
    Ok(Arc::new(AudioTranscriber::new(transcoder, recognizer)))
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Max Body Bytes: {}", args.max_body_bytes);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("Chat Timeout: {}s", args.chat_timeout_secs);
    info!("History Limit: {}", args.history_limit);
    info!("Speech Base URL: {}", args.speech_base_url.as_deref().unwrap_or("adapter default"));
    info!("Speech Language: {}", args.speech_language);
    info!("Speech Timeout: {}s", args.speech_timeout_secs);
    info!("FFmpeg Path: {}", args.ffmpeg_path);
    info!("-------------------------");

    let chat_client = initialize_chat_client(&args);
    let transcriber = initialize_transcriber(&args)?;
    let agent = Arc::new(ChatAgent::new(chat_client, transcriber, args.history_limit));
    if !agent.is_model_ready() {
        warn!("Chat requests will be answered with \"AI model not initialized.\" until restart");
    }

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
