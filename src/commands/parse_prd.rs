//! `tasksmith parse-prd` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::error::Result;
use crate::pipeline;
use crate::tasks::TaskStore;

/// Generates `num_tasks` tasks from the PRD at `prd_path` and writes them to `tasks_path`.
///
/// An existing tasks file is overwritten.
///
/// # Errors
///
/// Returns an error if the PRD cannot be read, generation fails, or the tasks
/// file cannot be written.
pub async fn run(
    ctx: &ServiceContext,
    prd_path: &Path,
    num_tasks: usize,
    tasks_path: &Path,
) -> Result<()> {
    let prd = ctx.fs.read_to_string(prd_path)?;
    let source = prd_path.display().to_string();
    let file = pipeline::parse_prd(ctx, &prd, &source, num_tasks).await?;

    TaskStore::new(ctx, tasks_path).save(&file)?;
    println!("Generated {} tasks from {source} into {}", file.tasks.len(), tasks_path.display());
    for task in &file.tasks {
        println!("  {:>3}. {}", task.id, task.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{replay_context, scratch_dir};
    use crate::error::Error;
    use serde_json::json;

    #[tokio::test]
    async fn writes_generated_tasks_file() {
        let dir = scratch_dir("parse_prd_writes");
        let prd = dir.join("prd.txt");
        std::fs::write(&prd, "A todo app with login.").unwrap();
        let tasks = dir.join("out/tasks.json");

        let ctx = replay_context(vec![(
            "llm",
            "stream",
            json!({"ok": {"chunks": [
                "{\"tasks\": [{\"id\": 1, \"title\": \"Scaffold\"}, ",
                "{\"id\": 2, \"title\": \"Login\", \"dependencies\": [1]}], \"metadata\": {}}"
            ]}}),
        )]);
        run(&ctx, &prd, 2, &tasks).await.unwrap();

        let saved = TaskStore::new(&ctx, &tasks).load().unwrap();
        assert_eq!(saved.tasks.len(), 2);
        assert_eq!(saved.metadata.total_tasks, 2);
        assert_eq!(saved.metadata.source_file, prd.display().to_string());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_prd_is_an_io_error() {
        let dir = scratch_dir("parse_prd_missing");
        let ctx = replay_context(vec![]);
        let err = run(&ctx, &dir.join("absent.txt"), 3, &dir.join("tasks.json")).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!dir.join("tasks.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
