// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus sources: the built-in sample documents and JSON corpus files.
//!
//! A corpus file is a JSON array of objects with `id`, `content`, and an
//! optional `metadata` map. Numeric ids are accepted and kept as strings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::store::DocumentInput;

/// The four customer-service documents used for demos and tests.
pub fn sample_documents() -> Vec<DocumentInput> {
    vec![
        DocumentInput::new(
            "1",
            "Our refund policy allows customers to return products within 30 days \
             of purchase for a full refund. Items must be in original condition.",
        )
        .with_metadata("category", "policy")
        .with_metadata("topic", "refunds"),
        DocumentInput::new(
            "2",
            "Shipping takes 3-5 business days for standard delivery. \
             Express shipping is available for an additional fee and takes 1-2 days.",
        )
        .with_metadata("category", "policy")
        .with_metadata("topic", "shipping"),
        DocumentInput::new(
            "3",
            "Customer support is available Monday through Friday, 9 AM to 5 PM EST. \
             You can reach us by phone, email, or live chat on our website.",
        )
        .with_metadata("category", "support")
        .with_metadata("topic", "contact"),
        DocumentInput::new(
            "4",
            "We accept all major credit cards, PayPal, and Apple Pay. \
             Payment is processed securely through our encrypted payment gateway.",
        )
        .with_metadata("category", "policy")
        .with_metadata("topic", "payment"),
    ]
}

#[derive(Deserialize)]
struct CorpusEntry {
    #[serde(deserialize_with = "id_to_string")]
    id: String,
    content: String,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

fn id_to_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "document id must be a string or number, got {}",
            other
        ))),
    }
}

fn metadata_to_strings(metadata: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    metadata
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

/// Parses a corpus from JSON text.
pub fn parse_documents(json: &str) -> Result<Vec<DocumentInput>> {
    let entries: Vec<CorpusEntry> =
        serde_json::from_str(json).context("Corpus must be a JSON array of documents")?;

    Ok(entries
        .into_iter()
        .map(|entry| DocumentInput {
            id: entry.id,
            content: entry.content,
            metadata: metadata_to_strings(entry.metadata),
        })
        .collect())
}

/// Loads a corpus file.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentInput>> {
    let path = path.as_ref();
    if !path.is_file() {
        bail!("Corpus file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus: {}", path.display()))?;
    parse_documents(&content).with_context(|| format!("Failed to parse corpus: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sample_documents() {
        let docs = sample_documents();
        assert_eq!(docs.len(), 4);
        assert!(docs[0].content.contains("refund policy"));
        assert_eq!(docs[3].metadata.get("topic").map(String::as_str), Some("payment"));
    }

    #[test]
    fn test_parse_documents_accepts_numeric_ids() {
        let docs = parse_documents(
            r#"[
                {"id": 7, "content": "refund", "metadata": {"topic": "refunds", "rank": 2}},
                {"id": "x", "content": "shipping"}
            ]"#,
        )
        .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "7");
        assert_eq!(docs[0].metadata.get("rank").map(String::as_str), Some("2"));
        assert_eq!(docs[0].metadata.get("topic").map(String::as_str), Some("refunds"));
        assert_eq!(docs[1].id, "x");
        assert!(docs[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_documents_rejects_bad_shapes() {
        assert!(parse_documents(r#"{"id": 1}"#).is_err());
        assert!(parse_documents(r#"[{"id": [1], "content": "x"}]"#).is_err());
        assert!(parse_documents(r#"[{"id": 1}]"#).is_err());
    }

    #[test]
    fn test_load_documents_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, r#"[{"id": 1, "content": "help"}]"#).unwrap();

        let docs = load_documents(&path).unwrap();
        assert_eq!(docs, vec![DocumentInput::new("1", "help")]);

        assert!(load_documents(dir.path().join("missing.json")).is_err());
    }
}
