use clap::Parser;
use dotenv::dotenv;
use gemini_voice_relay::cli::Args;
use log::error;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if args.google_api_key.trim().is_empty() {
        error!("Google API Key is not set. Please set GOOGLE_API_KEY in .env file.");
        std::process::exit(1);
    }

    gemini_voice_relay::run(args).await
}
