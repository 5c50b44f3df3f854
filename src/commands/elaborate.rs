//! `tasksmith elaborate` command.

use std::path::Path;

use super::load_task;
use crate::context::ServiceContext;
use crate::error::Result;
use crate::pipeline;

/// Prints a Markdown implementation brief for task `id`.
///
/// # Errors
///
/// Returns an error if the task is unknown or the provider call fails.
pub async fn run(ctx: &ServiceContext, id: u32, research: bool, tasks_path: &Path) -> Result<()> {
    let (_, task) = load_task(ctx, tasks_path, id)?;
    let brief = pipeline::elaborate_task(ctx, &task, research).await?;
    println!("# Task {}: {}\n\n{brief}", task.id, task.title);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{replay_context, scratch_dir, seed_tasks};
    use crate::error::Error;
    use serde_json::json;

    #[tokio::test]
    async fn elaborates_known_task() {
        let dir = scratch_dir("elaborate_known");
        let path = seed_tasks(&dir);
        let ctx = replay_context(vec![("llm", "complete", json!({"ok": {"text": "## Overview"}}))]);
        assert!(run(&ctx, 2, false, &path).await.is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn provider_failure_is_returned() {
        let dir = scratch_dir("elaborate_failure");
        let path = seed_tasks(&dir);
        let ctx = replay_context(vec![(
            "llm",
            "complete",
            json!({"err": "Anthropic API error (400): invalid_request_error: bad"}),
        )]);
        let err = run(&ctx, 2, false, &path).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.user_message().contains("rejected the request format"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
