//! Integration tests for the lodestone CLI

use std::process::Command;

fn cargo_run(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to run command")
}

#[test]
fn test_cli_help() {
    let output = cargo_run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("create"));
    assert!(stdout.contains("add"));
    assert!(stdout.contains("search"));
    assert!(stdout.contains("rebuild"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("remove"));
}

#[test]
fn test_cli_version() {
    let output = cargo_run(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lodestone"));
}

#[test]
fn test_create_help() {
    let output = cargo_run(&["create", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--chunk-size"));
    assert!(stdout.contains("--chunk-overlap"));
}

#[test]
fn test_search_help() {
    let output = cargo_run(&["search", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--top-k"));
    assert!(stdout.contains("--filter"));
    assert!(stdout.contains("--grep"));
    assert!(stdout.contains("--hybrid"));
}

#[test]
fn test_serve_help() {
    let output = cargo_run(&["serve", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--port"));
    assert!(stdout.contains("--cors"));
}

#[test]
fn test_add_help() {
    let output = cargo_run(&["add", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--metadata"));
    assert!(stdout.contains("--update"));
}

#[test]
fn test_index_lifecycle_via_cli() {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let dir_arg = data_dir.path().to_string_lossy().to_string();

    // Create an index
    let output = cargo_run(&["--data-dir", &dir_arg, "create", "smoke"]);
    assert!(output.status.success(), "create failed: {:?}", output);

    // Add a document from a file
    let doc_path = data_dir.path().join("note.txt");
    std::fs::write(&doc_path, "the quick brown fox jumps over the lazy dog").unwrap();
    let output = cargo_run(&[
        "--data-dir",
        &dir_arg,
        "add",
        "smoke",
        &doc_path.to_string_lossy(),
    ]);
    assert!(output.status.success(), "add failed: {:?}", output);

    // Rebuild succeeds and reports the new version
    let output = cargo_run(&["--data-dir", &dir_arg, "rebuild", "smoke"]);
    assert!(output.status.success(), "rebuild failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("version 1"));

    // Listing shows the index and its document
    let output = cargo_run(&["--data-dir", &dir_arg, "list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("smoke"));
    assert!(stdout.contains("1 document(s)"));

    // Grep search finds the document
    let output = cargo_run(&["--data-dir", &dir_arg, "search", "smoke", "quick brown", "--grep"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("note.txt"));

    // Semantic search finds it too (the CLI builds in-process when needed)
    let output = cargo_run(&["--data-dir", &dir_arg, "search", "smoke", "lazy dog"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("note.txt"));

    // Remove it again
    let output = cargo_run(&["--data-dir", &dir_arg, "remove", "smoke", "--force"]);
    assert!(output.status.success());

    let output = cargo_run(&["--data-dir", &dir_arg, "list"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("smoke"));
}
