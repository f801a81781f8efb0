// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use ragcore::config::{ConfigOutputFormat, EmbeddingProviderType};

/// ragcore - Semantic retrieval for retrieval-augmented generation
///
/// Embeds a corpus in memory, ranks documents against a question, and
/// assembles the context an external generation model would answer from.
#[derive(Parser, Debug)]
#[command(name = "ragcore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<ConfigOutputFormat> for OutputFormat {
    fn from(format: ConfigOutputFormat) -> Self {
        match format {
            ConfigOutputFormat::Text => OutputFormat::Text,
            ConfigOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Embedding provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliProvider {
    /// Deterministic keyword-frequency encoder
    Keyword,
    /// Neural sentence encoder (downloads all-MiniLM-L6-v2 on first use)
    Neural,
}

impl From<CliProvider> for EmbeddingProviderType {
    fn from(provider: CliProvider) -> Self {
        match provider {
            CliProvider::Keyword => EmbeddingProviderType::Keyword,
            CliProvider::Neural => EmbeddingProviderType::Neural,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve the most relevant documents for a question
    #[command(alias = "q")]
    Query {
        /// Question to retrieve context for
        question: String,

        /// JSON corpus file (defaults to the built-in sample documents)
        #[arg(short, long)]
        corpus: Option<String>,

        /// Number of documents to retrieve
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<usize>,

        /// Embedding provider (keyword or neural)
        #[arg(long, value_enum)]
        provider: Option<CliProvider>,

        /// Print the generation prompt instead of the bare context
        #[arg(long)]
        prompt: bool,

        /// Suppress progress and skipped-document warnings
        #[arg(short = 'q', long)]
        quiet: bool,
    },

    /// Print the embedding vector for a text
    Embed {
        /// Text to embed
        text: String,

        /// Embedding provider (keyword or neural)
        #[arg(long, value_enum)]
        provider: Option<CliProvider>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
