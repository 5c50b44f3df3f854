//! `tasksmith list` command.

use std::fmt::Write as _;
use std::path::Path;

use crate::context::ServiceContext;
use crate::error::Result;
use crate::tasks::{TaskStore, TasksFile};

/// Prints every task with its status, priority and dependencies.
///
/// # Errors
///
/// Returns an error if the tasks file is missing or unparseable.
pub fn run(ctx: &ServiceContext, tasks_path: &Path) -> Result<()> {
    let file = TaskStore::new(ctx, tasks_path).load()?;
    print!("{}", render(&file));
    Ok(())
}

/// Renders the task table, subtasks indented under their parent.
#[must_use]
pub fn render(file: &TasksFile) -> String {
    let mut out = String::new();
    if file.tasks.is_empty() {
        out.push_str("No tasks found.\n");
        return out;
    }

    let title_width = file.tasks.iter().map(|t| t.title.len()).max().unwrap_or(5).max(5);
    let _ = writeln!(out, "{}: {} tasks", file.metadata.project_name, file.tasks.len());
    let _ = writeln!(
        out,
        "{:>4}  {:<11}  {:<title_width$}  {:<8}  DEPENDS ON",
        "ID", "STATUS", "TITLE", "PRIORITY"
    );
    for task in &file.tasks {
        let deps = if task.dependencies.is_empty() {
            "-".to_string()
        } else {
            task.dependencies.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<11}  {:<title_width$}  {:<8}  {deps}",
            task.id,
            task.status.to_string(),
            task.title,
            task.priority.to_string(),
        );
        for subtask in &task.subtasks {
            let _ = writeln!(
                out,
                "      {:<6} {:<11}  {}",
                subtask.dotted_id(),
                subtask.status.to_string(),
                subtask.title
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{replay_context, scratch_dir, seed_tasks};

    #[test]
    fn renders_tasks_and_dotted_subtasks() {
        let dir = scratch_dir("list_render");
        let path = seed_tasks(&dir);
        let ctx = replay_context(vec![]);
        let file = TaskStore::new(&ctx, &path).load().unwrap();

        let out = render(&file);
        assert!(out.starts_with("demo: 2 tasks\n"));
        let login = out.lines().find(|l| l.contains("Add login")).unwrap();
        assert!(login.contains("pending"));
        assert!(login.contains("medium"));
        assert!(login.trim_end().ends_with('1'));
        assert!(out.lines().any(|l| l.trim_start().starts_with("2.1") && l.contains("Schema")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_file_says_so() {
        assert_eq!(render(&TasksFile::default()), "No tasks found.\n");
    }
}
