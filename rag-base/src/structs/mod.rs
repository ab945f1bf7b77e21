pub mod chunk;
pub mod ingest;
pub mod rag_base_config;
