//! Command line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rag_store::OverwritePolicy;

/// Load rulebooks into a vector store and ask questions about them.
#[derive(Parser, Debug)]
#[command(name = "rules-rag", version, about)]
pub struct Cli {
    /// Debug logging for the workspace crates (RUST_LOG still applies).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Vector store backend; `memory` is a throwaway dry run.
    #[arg(long, value_enum, global = true, default_value_t = StoreKind::Qdrant)]
    pub store: StoreKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Qdrant,
    Memory,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest a Markdown file into `{prefix}_{algorithm}_{chunk_length}`.
    Load {
        /// File name under the data directory.
        input_filename: String,
        collection_prefix: String,
        chunk_length: usize,

        /// Embedding model [default: EMBEDDING_MODEL or nomic-embed-text].
        #[arg(short = 'a', long = "algorithm")]
        algorithm: Option<String>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Ingest a PDF, caching its text under the outputs directory.
    LoadPdf {
        /// File name under the data directory.
        input_filename: String,
        collection_name: String,

        #[arg(long, default_value_t = 1000)]
        chunk_length: usize,

        #[arg(long, default_value_t = 500)]
        chunk_overlap: usize,

        /// Zero-based pages `START..END`, end exclusive [default: all].
        #[arg(long)]
        page_range: Option<String>,

        /// Group by page and split at `***Subheader***` markers.
        #[arg(long)]
        by_page: bool,

        /// Embedding model [default: EMBEDDING_MODEL or nomic-embed-text].
        #[arg(short = 'a', long = "algorithm")]
        algorithm: Option<String>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Answer a question from a collection.
    Query {
        collection: String,
        query: String,

        /// Embedding model; must match the one used at load time.
        #[arg(short = 'e', long = "embedding-model-name", alias = "embedding_model_name")]
        embedding_model: Option<String>,

        /// Number of documents to retrieve.
        #[arg(short = 'd', long = "documents")]
        documents: Option<usize>,

        /// Chunk-length label for the responses directory.
        #[arg(short = 'c', long, alias = "chunk_length", default_value = "unknown")]
        chunk_length: String,

        /// Chat model [default: OLLAMA_MODEL or llama3.2].
        #[arg(short = 'm', long = "model")]
        model: Option<String>,

        /// Where query/response pairs go [default: RAG_RESPONSES_DIR or ./responses].
        #[arg(long)]
        responses_dir: Option<PathBuf>,
    },

    /// List collection names.
    Collections,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PolicyArgs {
    /// Replace an existing collection and refresh the caches.
    #[arg(short = 'o', long, conflicts_with = "policy")]
    pub overwrite: bool,

    /// What to do if the collection already exists.
    #[arg(long, value_enum, default_value_t = PolicyArg::Abort)]
    pub policy: PolicyArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Abort,
    Overwrite,
    Merge,
}

impl PolicyArgs {
    pub fn resolve(self) -> OverwritePolicy {
        if self.overwrite {
            return OverwritePolicy::Overwrite;
        }
        match self.policy {
            PolicyArg::Abort => OverwritePolicy::AbortIfExists,
            PolicyArg::Overwrite => OverwritePolicy::Overwrite,
            PolicyArg::Merge => OverwritePolicy::Merge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_with_overwrite_flag() {
        let cli = Cli::parse_from(["rules-rag", "load", "lancer.md", "lancer", "800", "-o"]);
        let Command::Load {
            chunk_length,
            algorithm,
            policy,
            ..
        } = cli.command
        else {
            panic!("expected load");
        };
        assert_eq!(chunk_length, 800);
        assert!(algorithm.is_none());
        assert_eq!(policy.resolve(), OverwritePolicy::Overwrite);
        assert_eq!(cli.store, StoreKind::Qdrant);
    }

    #[test]
    fn load_pdf_defaults() {
        let cli = Cli::parse_from(["rules-rag", "load-pdf", "core.pdf", "core", "--by-page"]);
        let Command::LoadPdf {
            chunk_length,
            chunk_overlap,
            by_page,
            page_range,
            policy,
            ..
        } = cli.command
        else {
            panic!("expected load-pdf");
        };
        assert_eq!((chunk_length, chunk_overlap), (1000, 500));
        assert!(by_page);
        assert!(page_range.is_none());
        assert_eq!(policy.resolve(), OverwritePolicy::AbortIfExists);
    }

    #[test]
    fn query_flags() {
        let cli = Cli::parse_from([
            "rules-rag", "query", "core", "What is HP?", "-d", "4", "-c", "1000", "-m", "mistral",
            "--store", "memory",
        ]);
        let Command::Query {
            documents,
            chunk_length,
            model,
            ..
        } = cli.command
        else {
            panic!("expected query");
        };
        assert_eq!(documents, Some(4));
        assert_eq!(chunk_length, "1000");
        assert_eq!(model.as_deref(), Some("mistral"));
        assert_eq!(cli.store, StoreKind::Memory);
    }

    #[test]
    fn query_accepts_underscore_flags() {
        let cli = Cli::parse_from([
            "rules-rag",
            "query",
            "core",
            "What is HP?",
            "--embedding_model_name",
            "mxbai-embed-large",
            "--chunk_length",
            "800",
        ]);
        let Command::Query {
            embedding_model,
            chunk_length,
            ..
        } = cli.command
        else {
            panic!("expected query");
        };
        assert_eq!(embedding_model.as_deref(), Some("mxbai-embed-large"));
        assert_eq!(chunk_length, "800");
    }

    #[test]
    fn overwrite_conflicts_with_policy() {
        let res = Cli::try_parse_from([
            "rules-rag", "load", "a.md", "a", "100", "-o", "--policy", "merge",
        ]);
        assert!(res.is_err());
    }
}
