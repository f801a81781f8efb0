// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
}

/// Command isolated from any user or project config.
fn ragcore(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ragcore"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RAGCORE_LOG");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run ragcore");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn query_sample_corpus_returns_refund_policy_first() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(ragcore(&dir).args([
        "--format",
        "json",
        "query",
        "How do I return a product?",
        "--top-k",
        "3",
    ]));

    assert_eq!(json["model"], "keyword-frequency");
    assert_eq!(json["indexed"], 4);
    let results = json["results"].as_array().expect("results array");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["id"], "1");
    assert_eq!(results[0]["rank"], 1);
    assert!(results[0]["content"]
        .as_str()
        .unwrap()
        .contains("refund policy"));
    assert!(results[0]["score"].as_f64().unwrap() > results[1]["score"].as_f64().unwrap());

    let context = json["context"].as_str().unwrap();
    assert_eq!(context.matches("\n\n").count(), 2);
    assert!(json.get("prompt").is_none());
    assert!(json["skipped"].as_array().unwrap().is_empty());
}

#[test]
fn query_text_output_lists_scores_and_context() {
    let dir = TempDir::new().expect("tempdir");
    ragcore(&dir)
        .args(["query", "What payment methods do you accept?", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question: What payment methods"))
        .stdout(predicate::str::contains("1. [score "))
        .stdout(predicate::str::contains("Context:"))
        .stdout(predicate::str::contains("encrypted payment gateway"));
}

#[test]
fn query_with_prompt_renders_generation_input() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(ragcore(&dir).args([
        "--format",
        "json",
        "query",
        "How can I contact support?",
        "--top-k",
        "1",
        "--prompt",
    ]));

    let prompt = json["prompt"].as_str().expect("prompt string");
    assert!(prompt.starts_with("Context:\nCustomer support is available"));
    assert!(prompt.ends_with("\n\nQuestion: How can I contact support?\n\nAnswer:"));
}

#[test]
fn query_custom_corpus_file() {
    let dir = TempDir::new().expect("tempdir");
    write_file(
        &dir.path().join("docs.json"),
        r#"[
            {"id": 10, "content": "Laptops ship with a charger.", "metadata": {"topic": "shipping"}},
            {"id": 11, "content": "Ask customer support for help with a refund."},
            {"id": 11, "content": "Ask customer support for help with a refund."}
        ]"#,
    );

    let json = run_json(ragcore(&dir).args([
        "--format",
        "json",
        "--compact",
        "query",
        "I want my money back, refund please",
        "--corpus",
        "docs.json",
        "--top-k",
        "5",
    ]));

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    // Duplicates are kept and tie in insertion order.
    assert_eq!(results[0]["id"], "11");
    assert_eq!(results[0]["position"], 1);
    assert_eq!(results[1]["id"], "11");
    assert_eq!(results[1]["position"], 2);
    assert_eq!(results[2]["metadata"]["topic"], "shipping");
}

#[test]
fn query_top_k_zero_retrieves_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(ragcore(&dir).args([
        "--format",
        "json",
        "query",
        "refund",
        "--top-k",
        "0",
    ]));
    assert!(json["results"].as_array().unwrap().is_empty());
    assert_eq!(json["context"], "");
}

#[test]
fn project_config_sets_vocabulary_and_top_k() {
    let dir = TempDir::new().expect("tempdir");
    write_file(
        &dir.path().join(".ragcorerc.toml"),
        r#"
default_format = "json"

[embeddings]
provider = "keyword"
vocabulary = ["refund", "shipping"]

[retrieval]
top_k = 1
"#,
    );

    let json = run_json(ragcore(&dir).args(["query", "shipping times?"]));
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "2");

    let embedded = run_json(ragcore(&dir).args(["embed", "refund"]));
    assert_eq!(embedded["dimension"], 2);
}

#[test]
fn malformed_project_config_warns_once_and_uses_defaults() {
    let dir = TempDir::new().expect("tempdir");
    write_file(&dir.path().join(".ragcorerc.toml"), "[retrieval\ntop_k = ");

    let output = ragcore(&dir)
        .args(["--format", "json", "query", "How do I return a product?"])
        .output()
        .expect("run ragcore");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Failed to parse").count(), 1, "stderr: {stderr}");

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["top_k"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_corpus_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    ragcore(&dir)
        .args(["query", "refund", "--corpus", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corpus file not found"));
}

#[test]
fn malformed_corpus_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_file(&dir.path().join("bad.json"), r#"{"not": "an array"}"#);
    ragcore(&dir)
        .args(["query", "refund", "--corpus", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse corpus"));
}

#[test]
fn negative_top_k_is_rejected_by_the_parser() {
    let dir = TempDir::new().expect("tempdir");
    ragcore(&dir)
        .args(["query", "refund", "--top-k", "-1"])
        .assert()
        .failure();
}

#[test]
fn embed_prints_unit_vector() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(ragcore(&dir).args([
        "--format",
        "json",
        "embed",
        "Refunds and returns",
    ]));
    assert_eq!(json["dimension"], 15);
    assert!((json["norm"].as_f64().unwrap() - 1.0).abs() < 1e-6);

    let empty = run_json(ragcore(&dir).args(["--format", "json", "embed", "   "]));
    assert_eq!(empty["norm"], 0.0);
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().expect("tempdir");
    ragcore(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ragcore"));
}
