use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soupstone::bank::QuestionBank;
use soupstone::engine::{Inbound, TurnEngine};
use soupstone::llm::LlmConfig;
use soupstone::types::GameConfig;

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soupstone=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting soupstone...");

    let config = GameConfig::from_env();
    let bank = QuestionBank::load_file(&config.bank_file);
    tracing::info!("Question bank loaded: {} puzzle(s)", bank.len());

    let llm_config = LlmConfig::from_env();
    let provider = match llm_config.build_provider() {
        Ok(provider) => {
            tracing::info!("Reasoning provider initialized: {}", provider.name());
            Some(Arc::from(provider))
        }
        Err(e) => {
            tracing::warn!(
                "No reasoning provider available: {}. Falling back to keyword heuristics.",
                e
            );
            None
        }
    };

    let (engine, mut outbound) = TurnEngine::new(bank, provider, config);

    // Timeout summaries arrive out of band
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            println!("[{}]\n{}\n", message.session_key, message.text);
        }
    });

    // Console frontend: one line per inbound message
    let sender_id = std::env::var("SOUP_SENDER").unwrap_or_else(|_| "console".to_string());
    let is_admin = std::env::var("SOUP_ADMIN").is_ok();
    println!("Send `help` for the command list. Ctrl-D quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let reply = engine
            .handle(Inbound {
                text: line,
                sender_id: sender_id.clone(),
                group_id: None,
                is_admin,
            })
            .await;
        for text in reply.texts {
            println!("{}\n", text);
        }
    }

    let drained = engine.shutdown().await;
    tracing::info!("Goodbye ({} session(s) closed)", drained);
}
