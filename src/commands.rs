//! Subcommand runners.

use std::io::IsTerminal;
use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use anyhow::{Context, Result};
use colored::Colorize;
use contextor::{AskRequest, IndicatifProgress, NoopProgress, OllamaChat, Progress, QueryConfig};
use rag_base::{
    ChunkMode, ChunkParams, IngestOutcome, IngestRequest, OllamaEmbedder, RagPaths,
    ingest_document, parse_page_range,
};
use rag_store::{InMemoryStore, RagStore, StoreConfig};
use tracing::info;

use crate::cli::{Cli, Command, StoreKind};

pub async fn run(cli: Cli) -> Result<()> {
    let store = open_store(cli.store)?;
    let paths = RagPaths::from_env();

    match cli.command {
        Command::Load {
            input_filename,
            collection_prefix,
            chunk_length,
            algorithm,
            policy,
        } => {
            let profiles = LlmServiceProfiles::from_env(None, algorithm.as_deref())?;
            let embedder = OllamaEmbedder::new(profiles.embedding_service());
            let model = profiles.models().1.to_string();
            let req = IngestRequest::markdown(
                &paths,
                &input_filename,
                &collection_prefix,
                &model,
                chunk_length,
                policy.resolve(),
            )?;
            report(ingest_document(&req, &embedder, &store).await?);
        }

        Command::LoadPdf {
            input_filename,
            collection_name,
            chunk_length,
            chunk_overlap,
            page_range,
            by_page,
            algorithm,
            policy,
        } => {
            let profiles = LlmServiceProfiles::from_env(None, algorithm.as_deref())?;
            let embedder = OllamaEmbedder::new(profiles.embedding_service());
            let pages = page_range.as_deref().map(parse_page_range).transpose()?;
            let mode = if by_page {
                ChunkMode::Pages
            } else {
                ChunkMode::Markdown
            };
            let req = IngestRequest::pdf(
                &paths,
                &input_filename,
                &collection_name,
                profiles.models().1,
                ChunkParams::new(chunk_length, chunk_overlap)?,
                pages,
                mode,
                policy.resolve(),
            );
            report(ingest_document(&req, &embedder, &store).await?);
        }

        Command::Query {
            collection,
            query,
            embedding_model,
            documents,
            chunk_length,
            model,
            responses_dir,
        } => {
            let profiles =
                LlmServiceProfiles::from_env(model.as_deref(), embedding_model.as_deref())?;
            let embedder = OllamaEmbedder::new(profiles.embedding_service());
            let chat = OllamaChat::new(profiles.chat_service());

            let qcfg = QueryConfig::from_env()?;
            let dir = responses_dir.unwrap_or_else(|| paths.responses_dir.clone());
            let mut req = AskRequest::new(&qcfg, collection, query, dir);
            req.chunk_label = chunk_length;
            if let Some(k) = documents {
                req.top_k = k;
            }

            let progress: Box<dyn Progress> = if std::io::stderr().is_terminal() {
                Box::new(IndicatifProgress::spinner())
            } else {
                Box::new(NoopProgress)
            };
            let answer = contextor::ask(&req, &embedder, &chat, &store, progress.as_ref()).await;
            progress.finish("");
            let answer = answer?;

            println!("{}", answer.response.trim());
            eprintln!(
                "{} {} documents, saved to {}",
                "retrieved".dimmed(),
                answer.documents.len(),
                answer.artifact_dir.display()
            );
        }

        Command::Collections => {
            let mut names = store.list_collections().await?;
            names.sort();
            if names.is_empty() {
                eprintln!("{}", "no collections".yellow());
            }
            for name in names {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn open_store(kind: StoreKind) -> Result<RagStore> {
    let cfg = StoreConfig::from_env().context("vector store config")?;
    Ok(match kind {
        StoreKind::Qdrant => RagStore::qdrant(cfg).context("connecting to Qdrant")?,
        StoreKind::Memory => RagStore::with_store(cfg, Arc::new(InMemoryStore::new())),
    })
}

fn report(outcome: IngestOutcome) {
    match outcome {
        IngestOutcome::Ingested(s) => {
            info!(collection = %s.collection, chunks = s.chunks, "ingestion finished");
            println!(
                "{} {} chunks into '{}' in {} batches ({:?}{})",
                "ingested".green().bold(),
                s.chunks,
                s.collection,
                s.batches,
                s.prepared,
                if s.embeddings_cached {
                    ", cached embeddings"
                } else {
                    ""
                },
            );
        }
        IngestOutcome::NothingToIngest { source } => {
            println!(
                "{} {} produced no chunks",
                "nothing to ingest:".yellow().bold(),
                source.display()
            );
        }
    }
}
