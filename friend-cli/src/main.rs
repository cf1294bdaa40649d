//! friend CLI: submit a message to the match pipeline or list stored messages.
//! Config from env (`.env` supported) and CLI args.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use embedding::EnvEmbeddingConfig;
use friend_cli::{render_outcome, render_recent, Cli, Commands};
use friend_core::init_tracing;
use llm_client::{EnvLlmConfig, OpenAILlmClient};
use matcher::{EnvMatchConfig, MatchPipeline};
use message_store::{JsonFileStore, MessageStore};
use openai_embedding::OpenAIEmbedding;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = EnvMatchConfig::from_env().context("Load match config from env")?;
    if let Some(path) = cli.data_path {
        config.data_path = path;
    }
    init_tracing(&config.log_file)
        .with_context(|| format!("Initialize logging to {}", config.log_file.display()))?;

    match cli.command {
        Commands::Submit {
            nickname,
            text,
            json,
        } => handle_submit(config, &nickname, &text, json).await,
        Commands::List { limit } => handle_list(config, limit).await,
    }
}

/// Wires the OpenAI-compatible embedder and LLM client with the JSON store and runs one match.
async fn handle_submit(config: EnvMatchConfig, nickname: &str, text: &str, json: bool) -> Result<()> {
    let embedding_config = EnvEmbeddingConfig::from_env()?;
    embedding_config
        .validate()
        .context("Embedding config (MISTRAL_API_KEY / OPENAI_API_KEY)")?;
    let llm_config = EnvLlmConfig::from_env().context("LLM config")?;

    let pipeline = MatchPipeline::new(
        Arc::new(OpenAIEmbedding::from_config(&embedding_config)),
        Arc::new(OpenAILlmClient::from_config(&llm_config)),
        Arc::new(JsonFileStore::new(&config.data_path)),
        config.options.clone(),
    );

    let outcome = match pipeline.run(nickname, text).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(kind = e.kind(), error = %e, "match failed");
            return Err(anyhow::Error::new(e).context("Match failed"));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome));
    }
    Ok(())
}

async fn handle_list(config: EnvMatchConfig, limit: usize) -> Result<()> {
    let store = JsonFileStore::new(&config.data_path);
    let corpus = store
        .load()
        .await
        .with_context(|| format!("Load corpus from {}", config.data_path.display()))?;
    print!("{}", render_recent(&corpus, limit));
    Ok(())
}
