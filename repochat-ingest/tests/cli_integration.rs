use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{TempDir, tempdir};

/// Helper to run the CLI binary with given args
fn run_cli(args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_repochat-ingest"));
    cmd.args(args).env("RUST_LOG", "error"); // Reduce log noise

    let output = cmd.output()?;
    Ok(output)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_files(root: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, content)?;
    }
    Ok(())
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should be installed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Helper to build a checkout with code, docs, and vendored dependencies
fn create_checkout() -> Result<TempDir> {
    let dir = tempdir()?;
    write_files(
        dir.path(),
        &[
            ("src/main.rs", "fn main() {\n    println!(\"hi\");\n}\n"),
            ("lib/util.py", "def util():\n    return 1\n"),
            ("README.md", "# demo\n"),
            ("node_modules/dep/index.js", "module.exports = 1;\n"),
        ],
    )?;
    Ok(dir)
}

#[test]
fn test_files_json_lists_code_files() -> Result<()> {
    let checkout = create_checkout()?;
    let dir = checkout.path().to_string_lossy().into_owned();

    let output = run_cli(&["files", &dir, "--format", "json"])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let files: Vec<Value> = serde_json::from_str(&stdout(&output))?;
    let paths: Vec<&str> = files.iter().filter_map(|f| f["path"].as_str()).collect();
    assert_eq!(paths, vec!["lib/util.py", "src/main.rs"]);

    let main_rs = &files[1];
    assert_eq!(main_rs["lines"], 3);
    assert_eq!(main_rs["bytes"], 34);
    Ok(())
}

#[test]
fn test_files_summary_respects_max_file_size() -> Result<()> {
    let checkout = create_checkout()?;
    let dir = checkout.path().to_string_lossy().into_owned();

    let output = run_cli(&["--max-file-size", "30", "files", &dir])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("Found 1 code files in "), "{out}");
    assert!(out.contains("  lib/util.py (2 lines)"));
    assert!(!out.contains("src/main.rs"));
    Ok(())
}

#[test]
fn test_parse_prints_owner_name_and_clone_url() -> Result<()> {
    let output = run_cli(&["parse", "https://github.com/acme/widgets.git"])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Owner: acme\n"));
    assert!(out.contains("Name: widgets\n"));
    assert!(out.contains("Clone URL: https://github.com/acme/widgets.git\n"));
    Ok(())
}

#[test]
fn test_parse_rejects_extra_segments() -> Result<()> {
    let output = run_cli(&["parse", "a/b/c"])?;

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(
        stderr(&output).contains("Error: Invalid repo format"),
        "stderr: {}",
        stderr(&output)
    );
    Ok(())
}

#[test]
fn test_invalid_format_is_a_usage_error() -> Result<()> {
    let output = run_cli(&["files", ".", "--format", "yaml"])?;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid format: yaml"));
    Ok(())
}

#[test]
fn test_ingest_local_clone_as_json() -> Result<()> {
    let upstream = create_checkout()?;
    run_git(upstream.path(), &["init", "--initial-branch=main"]);
    run_git(upstream.path(), &["config", "user.name", "test-user"]);
    run_git(upstream.path(), &["config", "user.email", "test@example.com"]);
    run_git(upstream.path(), &["add", "."]);
    run_git(upstream.path(), &["commit", "-m", "initial"]);

    let clone_root = tempdir()?;
    let url = format!("file://{}", upstream.path().display());
    let root = clone_root.path().to_string_lossy().into_owned();

    let output = run_cli(&["ingest", &url, "--clone-root", &root, "--format", "json"])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: Value = serde_json::from_str(&stdout(&output))?;
    assert_eq!(report["repo"], url.as_str());
    assert_eq!(report["branch"], "main");
    assert_eq!(report["commitSha"].as_str().map(str::len), Some(40));
    assert_eq!(report["filesProcessed"], 2);
    assert_eq!(report["chunks"], 2);

    // The temporary checkout is removed once the run finishes
    assert_eq!(std::fs::read_dir(clone_root.path())?.count(), 0);
    Ok(())
}
