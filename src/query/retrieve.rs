// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieve context for a question

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::OutputFormat;
use ragcore::config::{Config, EmbeddingProviderType};
use ragcore::corpus::{load_documents, sample_documents};
use ragcore::embedding::build_provider;
use ragcore::indexer::build_store_with_progress;
use ragcore::output::{
    colorize_context, colorize_heading, colorize_id, colorize_score, colorize_warning, preview,
    print_json, use_colors,
};
use ragcore::RetrievalPipeline;

const PREVIEW_CHARS: usize = 80;

/// Ranked document for JSON output
#[derive(Debug, Serialize)]
struct RetrievedDocument<'a> {
    rank: usize,
    id: &'a str,
    position: usize,
    score: f32,
    content: &'a str,
    metadata: &'a BTreeMap<String, String>,
}

/// Skipped document for JSON output
#[derive(Debug, Serialize)]
struct SkippedDocument {
    index: usize,
    id: String,
    error: String,
    retryable: bool,
}

/// Full retrieval response for JSON output
#[derive(Debug, Serialize)]
struct RetrievalResponse<'a> {
    query: &'a str,
    model: &'a str,
    top_k: usize,
    indexed: usize,
    results: Vec<RetrievedDocument<'a>>,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    skipped: Vec<SkippedDocument>,
}

/// Options for the query command
pub struct RetrieveOptions<'a> {
    pub question: &'a str,
    pub corpus: Option<&'a str>,
    pub top_k: Option<usize>,
    pub provider: Option<EmbeddingProviderType>,
    pub prompt: bool,
    pub quiet: bool,
}

/// Run the query command
pub fn run(
    options: RetrieveOptions<'_>,
    config: &Config,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let top_k = config.merge_top_k(options.top_k);

    let mut embedding_config = config.embeddings().clone();
    embedding_config.provider = Some(config.merge_provider(options.provider));
    let provider = build_provider(&embedding_config).context("Failed to set up embedding provider")?;

    let documents = match options.corpus {
        Some(path) => load_documents(path)?,
        None => sample_documents(),
    };

    let show_progress = !options.quiet && format == OutputFormat::Text;
    let outcome = build_store_with_progress(provider, documents, show_progress);
    let store = outcome.store;

    let pipeline = RetrievalPipeline::for_store(&store).with_delimiter(config.retrieval().delimiter());
    let retrieval = pipeline
        .answer(options.question, &store, top_k)
        .context("Retrieval failed")?;
    let prompt = options
        .prompt
        .then(|| retrieval.generation_request().to_prompt());

    match format {
        OutputFormat::Json => {
            let response = RetrievalResponse {
                query: &retrieval.query,
                model: store.provider().model_id(),
                top_k,
                indexed: store.size(),
                results: retrieval
                    .results
                    .iter()
                    .enumerate()
                    .map(|(i, result)| RetrievedDocument {
                        rank: i + 1,
                        id: &result.document.id,
                        position: result.document.position,
                        score: result.score,
                        content: &result.document.content,
                        metadata: &result.document.metadata,
                    })
                    .collect(),
                context: &retrieval.context,
                prompt,
                skipped: outcome
                    .failures
                    .iter()
                    .map(|failure| SkippedDocument {
                        index: failure.index,
                        id: failure.id.clone(),
                        error: failure.error.to_string(),
                        retryable: failure.error.is_retryable(),
                    })
                    .collect(),
            };
            print_json(&response, compact)?;
        }
        OutputFormat::Text => {
            let use_color = use_colors();

            if !options.quiet {
                for failure in &outcome.failures {
                    eprintln!(
                        "{} Skipped document {} (#{}): {}",
                        colorize_warning("!", use_color),
                        failure.id,
                        failure.index,
                        failure.error
                    );
                }
            }

            println!(
                "{} {}",
                colorize_heading("Question:", use_color),
                retrieval.query
            );

            if retrieval.results.is_empty() {
                println!("No documents retrieved ({} indexed)", store.size());
                return Ok(());
            }

            println!("\n{}", colorize_heading("Retrieved documents:", use_color));
            for (i, result) in retrieval.results.iter().enumerate() {
                println!(
                    "  {}. [score {}] {} {}",
                    i + 1,
                    colorize_score(result.score, use_color),
                    colorize_id(&result.document.id, use_color),
                    preview(&result.document.content, PREVIEW_CHARS)
                );
            }

            match prompt {
                Some(prompt) => {
                    println!("\n{}", colorize_heading("Prompt:", use_color));
                    println!("{}", colorize_context(&prompt, use_color));
                }
                None => {
                    println!("\n{}", colorize_heading("Context:", use_color));
                    println!("{}", colorize_context(&retrieval.context, use_color));
                }
            }
        }
    }

    Ok(())
}
