//! Integration tests for top-level CLI behavior.

use std::process::Command;

fn run_tasksmith(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_tasksmith");
    Command::new(bin)
        .args(args)
        .env_remove("TASKSMITH_RECORD")
        .env_remove("RUST_LOG")
        .env("ANTHROPIC_API_KEY", "")
        .output()
        .expect("failed to run tasksmith binary")
}

#[test]
fn help_lists_subcommands() {
    let output = run_tasksmith(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for name in ["parse-prd", "list", "expand", "analyze", "elaborate"] {
        assert!(stdout.contains(name), "missing {name} in help");
    }
}

#[test]
fn expand_help_shows_flags() {
    let output = run_tasksmith(&["expand", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--id"));
    assert!(stdout.contains("--research"));
    assert!(stdout.contains("--file"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_tasksmith(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn list_without_tasks_file_fails_with_hint() {
    let output = run_tasksmith(&["list", "--file", "/no/such/place/tasks.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Tasks file not found"));
    assert!(stderr.contains("parse-prd"));
}

#[test]
fn list_prints_existing_tasks() {
    let dir = std::env::temp_dir().join("tasksmith_cli_list");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tasks.json");
    std::fs::write(
        &path,
        r#"{"tasks": [{"id": 1, "title": "Write README", "status": "in-progress"}],
            "metadata": {"projectName": "docs"}}"#,
    )
    .unwrap();

    let output = run_tasksmith(&["list", "--file", path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("docs: 1 tasks"));
    assert!(stdout.contains("Write README"));
    assert!(stdout.contains("in-progress"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parse_prd_without_api_key_names_the_variable() {
    let dir = std::env::temp_dir().join("tasksmith_cli_no_key");
    std::fs::create_dir_all(&dir).unwrap();
    let prd = dir.join("prd.txt");
    std::fs::write(&prd, "Build a CLI.").unwrap();
    let tasks = dir.join("tasks.json");

    let output = run_tasksmith(&[
        "parse-prd",
        prd.to_str().unwrap(),
        "--file",
        tasks.to_str().unwrap(),
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("ANTHROPIC_API_KEY"));
    assert!(!tasks.exists());

    let _ = std::fs::remove_dir_all(&dir);
}
