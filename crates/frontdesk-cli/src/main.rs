//! Frontdesk CLI
//!
//! Drives the routing core the way the web transport does: one session,
//! serialized turns, streamed output chunks.

use anyhow::Result;
use clap::Parser;
use frontdesk_core::{
    load_reranker, BookingHandler, Config, ConversationState, DataQueryHandler, GeneralHandler,
    HandlerSet, HttpDataBackend, HttpEmbedder, InquiryHandler, LlmClassifier, OpenAiClient,
    QdrantIndex, RetrievalPipeline, Router,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

mod app;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Chat => run_chat(&config).await,
        Commands::Ask { query } => run_ask(&config, &query).await,
        Commands::Retrieve {
            query,
            top_k,
            json,
        } => run_retrieve(&config, &query, top_k, json).await,
    }
}

async fn build_router(config: &Config) -> Result<Router> {
    let llm = Arc::new(OpenAiClient::new(config.llm_service.clone())?);
    let index = Arc::new(QdrantIndex::new(config.vector_index.clone())?);
    let reranker = load_reranker(config.reranker.clone()).await;

    let pipeline = Arc::new(RetrievalPipeline::new(
        Arc::new(HttpEmbedder::new(llm.clone())),
        index,
        reranker,
        config.router.candidate_pool,
    ));

    let backend = Arc::new(HttpDataBackend::new(
        config.data_service.url.clone(),
        config.data_service.timeout_secs,
    )?);

    let handlers = HandlerSet {
        inquiry: Arc::new(InquiryHandler::new(
            llm.clone(),
            pipeline,
            config.router.top_k,
        )),
        booking: Arc::new(BookingHandler::new(llm.clone())),
        general: Arc::new(GeneralHandler::new(llm.clone())),
        data_query: Arc::new(DataQueryHandler::new(llm.clone(), backend)),
    };

    Ok(Router::new(
        Arc::new(LlmClassifier::new(llm)),
        handlers,
        config.router.max_hops,
    ))
}

async fn run_chat(config: &Config) -> Result<()> {
    let router = build_router(config).await?;
    let mut state = ConversationState::new();

    println!("frontdesk chat (empty line to quit)");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        stream_turn(&router, &mut state, line).await;
    }
    Ok(())
}

async fn run_ask(config: &Config, query: &str) -> Result<()> {
    let router = build_router(config).await?;
    let mut state = ConversationState::new();
    stream_turn(&router, &mut state, query).await;
    Ok(())
}

async fn stream_turn(router: &Router, state: &mut ConversationState, query: &str) {
    let (tx, mut rx) = mpsc::channel(8);
    let printer = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            println!("{}", chunk);
        }
    });

    let phase = router.process_turn("cli", state, query, &tx).await;
    drop(tx);
    let _ = printer.await;
    tracing::info!(?phase, "Turn finished");
}

async fn run_retrieve(config: &Config, query: &str, top_k: usize, json: bool) -> Result<()> {
    let pipeline = {
        // Resolve the reranker so `retrieve` shows what the inquiry
        // handler would actually see
        let llm = Arc::new(OpenAiClient::new(config.llm_service.clone())?);
        let index = Arc::new(QdrantIndex::new(config.vector_index.clone())?);
        let reranker = load_reranker(config.reranker.clone()).await;
        RetrievalPipeline::new(
            Arc::new(HttpEmbedder::new(llm)),
            index,
            reranker,
            config.router.candidate_pool,
        )
    };

    let results = pipeline.retrieve(query, top_k).await?;

    if json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "title": c.title,
                    "vector_score": c.vector_score,
                    "rerank_score": c.rerank_score,
                    "text": c.text,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (i, c) in results.iter().enumerate() {
            match c.rerank_score {
                Some(score) => println!(
                    "{}. [{}] rerank={:.4} vector={:.4}",
                    i + 1,
                    c.id,
                    score,
                    c.vector_score
                ),
                None => println!("{}. [{}] vector={:.4}", i + 1, c.id, c.vector_score),
            }
            println!("   {}", c.title);
        }
    }
    Ok(())
}
