// SPDX-License-Identifier: MIT OR Apache-2.0

//! Print the embedding of a text

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::OutputFormat;
use ragcore::config::{Config, EmbeddingProviderType};
use ragcore::embedding::build_provider;
use ragcore::output::{colorize_heading, print_json, use_colors};

/// Embedding for JSON output
#[derive(Debug, Serialize)]
struct EmbeddingResponse<'a> {
    text: &'a str,
    model: &'a str,
    dimension: usize,
    norm: f32,
    embedding: &'a [f32],
}

/// Run the embed command
pub fn run(
    text: &str,
    provider: Option<EmbeddingProviderType>,
    config: &Config,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let mut embedding_config = config.embeddings().clone();
    embedding_config.provider = Some(config.merge_provider(provider));
    let provider = build_provider(&embedding_config).context("Failed to set up embedding provider")?;

    let embedding = provider.encode(text).context("Failed to embed text")?;
    let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();

    match format {
        OutputFormat::Json => {
            let response = EmbeddingResponse {
                text,
                model: provider.model_id(),
                dimension: embedding.len(),
                norm,
                embedding: &embedding,
            };
            print_json(&response, compact)?;
        }
        OutputFormat::Text => {
            let use_color = use_colors();
            println!(
                "{} {} ({} dimensions, norm {:.6})",
                colorize_heading("Model:", use_color),
                provider.model_id(),
                embedding.len(),
                norm
            );
            let values: Vec<String> = embedding.iter().map(|v| format!("{:.4}", v)).collect();
            println!("[{}]", values.join(", "));
        }
    }

    Ok(())
}
