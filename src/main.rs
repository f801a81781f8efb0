// SPDX-License-Identifier: MIT OR Apache-2.0

//! ragcore - Semantic retrieval tool
//!
//! Indexes a corpus in memory with a keyword or neural embedding provider
//! and prints the ranked documents and assembled context for a question.

mod cli;
mod query;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands, OutputFormat};
use ragcore::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with RAGCORE_LOG env var (e.g., RAGCORE_LOG=debug ragcore query "...")
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("RAGCORE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let format = cli
        .format
        .or_else(|| config.default_format.map(OutputFormat::from))
        .unwrap_or(OutputFormat::Text);

    match cli.command {
        Commands::Query {
            question,
            corpus,
            top_k,
            provider,
            prompt,
            quiet,
        } => {
            query::retrieve::run(
                query::retrieve::RetrieveOptions {
                    question: &question,
                    corpus: corpus.as_deref(),
                    top_k,
                    provider: provider.map(Into::into),
                    prompt,
                    quiet,
                },
                &config,
                format,
                cli.compact,
            )?;
        }
        Commands::Embed { text, provider } => {
            query::embed::run(
                &text,
                provider.map(Into::into),
                &config,
                format,
                cli.compact,
            )?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ragcore", &mut std::io::stdout());
        }
    }

    Ok(())
}
