//! `tasksmith expand` command.

use std::path::Path;

use super::load_task;
use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::pipeline::{self, SubtaskOptions};
use crate::tasks::TaskStore;

/// Arguments of `expand`.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// Task to expand.
    pub id: u32,
    /// Subtask count; `DEFAULT_SUBTASKS` when absent.
    pub num: Option<usize>,
    /// Research-backed generation, appended to existing subtasks.
    pub research: bool,
    /// Extra guidance for the model.
    pub prompt: String,
}

/// Expands a task and saves the tasks file.
///
/// Without research the task's subtasks are replaced by a strictly validated
/// breakdown. With research, new subtasks are generated from the next free
/// number and appended; unusable output yields placeholders instead of an error.
///
/// # Errors
///
/// Returns an error if the task is unknown, generation fails, or saving fails.
pub async fn run(ctx: &ServiceContext, opts: &ExpandOptions, tasks_path: &Path) -> Result<()> {
    let (mut file, task) = load_task(ctx, tasks_path, opts.id)?;
    let num = match opts.num {
        Some(num) => num,
        None => usize::try_from(ctx.config.default_subtasks)
            .map_err(|e| Error::Config(format!("DEFAULT_SUBTASKS: {e}")))?,
    };

    let generated = if opts.research {
        let subtask_opts = SubtaskOptions {
            num_subtasks: num,
            next_id: task.next_subtask_id(),
            context: opts.prompt.clone(),
            research: true,
        };
        pipeline::generate_subtasks(ctx, &task, &subtask_opts).await?
    } else {
        pipeline::expand_task(ctx, &task, num, &opts.prompt).await?
    };

    let Some(target) = file.task_mut(opts.id) else {
        return Err(Error::Store(format!("Task {} disappeared while expanding", opts.id)));
    };
    if opts.research {
        target.subtasks.extend(generated.iter().cloned());
    } else {
        target.subtasks.clone_from(&generated);
    }
    TaskStore::new(ctx, tasks_path).save(&file)?;

    println!("Task {}: {} subtasks added", opts.id, generated.len());
    for subtask in &generated {
        println!("  {:<6} {}", subtask.dotted_id(), subtask.title);
    }
    Ok(())
}
