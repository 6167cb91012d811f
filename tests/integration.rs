use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn audit_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_idx-audit"))
}

const DUMP: &str = "\
doc-2|Q3 report.pdf|12|t|f|5|https://example.com/q3|2025-03-01 10:00:00+00
doc-1|notes.txt||f|f|||2025-01-15 08:30:00+00
";

fn setup_test_env(dump: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let dump_path = root.join("catalog.txt");
    fs::write(&dump_path, dump).unwrap();

    let config_content = format!(
        r#"[catalog]
dump_path = "{}"

[index]
endpoint = "http://127.0.0.1:9/search/"
timeout_secs = 2

[output]
dir = "{}/outputs"
"#,
        dump_path.display(),
        root.display()
    );

    let config_path = root.join("audit.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_audit(config_path: &Path, args: &[&str]) -> (String, String, Option<i32>) {
    let binary = audit_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run idx-audit at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code())
}

#[test]
fn test_missing_subcommand_prints_usage() {
    let (_tmp, config_path) = setup_test_env(DUMP);
    let (_, stderr, code) = run_audit(&config_path, &[]);
    assert_eq!(code, Some(2));
    assert!(stderr.contains("Usage"), "stderr={}", stderr);
}

#[test]
fn test_chunks_requires_semantic_id() {
    let (_tmp, config_path) = setup_test_env(DUMP);
    let (_, stderr, code) = run_audit(&config_path, &["chunks"]);
    assert_eq!(code, Some(2));
    assert!(stderr.contains("Usage"), "stderr={}", stderr);
}

#[test]
fn test_documents_from_dump() {
    let (tmp, config_path) = setup_test_env(DUMP);

    let (stdout, stderr, code) = run_audit(&config_path, &["documents", "--top", "1"]);
    assert_eq!(code, Some(0), "stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Found 2 documents."));
    assert!(stdout.contains("Top 1 documents:"));
    assert!(stdout.contains("Q3 report.pdf"));
    assert!(!stdout.contains("notes.txt"));

    let saved = fs::read_to_string(tmp.path().join("outputs/catalog.json")).unwrap();
    let docs: serde_json::Value = serde_json::from_str(&saved).unwrap();
    let docs = docs.as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["id"], "doc-2");
    assert_eq!(docs[0]["chunk_count"], 12);
    assert_eq!(docs[0]["from_ingestion_api"], true);
    assert_eq!(docs[0]["boost"], 5);
    assert!(docs[1]["chunk_count"].is_null());
    assert!(docs[1]["boost"].is_null());
}

#[test]
fn test_documents_no_save() {
    let (tmp, config_path) = setup_test_env(DUMP);
    let (_, _, code) = run_audit(&config_path, &["--no-save", "documents"]);
    assert_eq!(code, Some(0));
    assert!(!tmp.path().join("outputs/catalog.json").exists());
}

#[test]
fn test_malformed_dump_fails() {
    let (_tmp, config_path) = setup_test_env("doc-1|a.pdf|3|t|f|||2025\nbroken|row\n");
    let (_, stderr, code) = run_audit(&config_path, &["documents"]);
    assert_eq!(code, Some(1));
    assert!(
        stderr.contains("malformed catalog record on line 2"),
        "stderr={}",
        stderr
    );
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("audit.toml");
    fs::write(&config_path, "[index]\nhits = 0\n").unwrap();
    let (_, stderr, code) = run_audit(&config_path, &["documents"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("index.hits"), "stderr={}", stderr);
}

#[test]
fn test_unreachable_index_is_transport_error() {
    let (_tmp, config_path) = setup_test_env(DUMP);
    let (_, stderr, code) = run_audit(&config_path, &["chunks", "Q3 report.pdf"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("transport error"), "stderr={}", stderr);
}
