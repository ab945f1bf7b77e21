//! Document side of the RAG pipeline.
//!
//! Public API:
//! - [`loader::load_document`]: PDF/Markdown → text, with a markdown cache
//! - [`chunker::chunk_document`]: header-aware, length-bounded splitting
//! - [`embedding_cache::EmbeddingCache`]: content-addressed vector cache
//! - [`ingest::ingest_document`]: the whole load → store run

pub mod chunker;
pub mod embedding;
pub mod embedding_cache;
pub mod errors;
pub mod ingest;
pub mod loader;
pub mod structs;

pub use embedding::{EmbeddingsProvider, OllamaEmbedder};
pub use errors::rag_base_error::{RagBaseError, Result};
pub use ingest::ingest_document;
pub use structs::chunk::{Chunk, ChunkMode, ChunkParams};
pub use structs::ingest::{IngestOutcome, IngestRequest, IngestSummary};
pub use structs::rag_base_config::{RagPaths, collection_name, parse_page_range};
