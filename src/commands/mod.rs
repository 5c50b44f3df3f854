//! Command dispatch and handlers.

pub mod analyze;
pub mod elaborate;
pub mod expand;
pub mod list;
pub mod parse_prd;

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::tasks::{Task, TaskStore, TasksFile};

/// Dispatch a parsed command to its handler.
///
/// When `TASKSMITH_RECORD` is set to a directory path, every provider
/// interaction is recorded to a cassette file in that directory.
///
/// # Errors
///
/// Returns the user-facing message of whatever error the handler produced.
/// Technical detail is only logged, at debug level.
pub fn dispatch(command: &Command, config: Config) -> std::result::Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    let (ctx, session) = match env::var("TASKSMITH_RECORD") {
        Ok(dir) => {
            let session = RecordingSession::start(Path::new(&dir), &config.model)
                .map_err(|e| e.user_message())?;
            (ServiceContext::recording(config, &session), Some(session))
        }
        Err(_) => (ServiceContext::live(config), None),
    };

    let result = runtime.block_on(dispatch_with_context(command, &ctx));

    // Finish recording after the command completes, even on error.
    if let Some(session) = session {
        drop(ctx);
        finish_recording(session)?;
    }

    result.map_err(|e| {
        debug!(error = ?e, "command failed");
        e.user_message()
    })
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns the handler's error untouched.
pub async fn dispatch_with_context(command: &Command, ctx: &ServiceContext) -> Result<()> {
    match command {
        Command::ParsePrd { prd, num_tasks, files } => {
            parse_prd::run(ctx, prd, *num_tasks, &files.file).await
        }
        Command::List { files } => list::run(ctx, &files.file),
        Command::Expand { id, num, research, prompt, files } => {
            let opts = expand::ExpandOptions {
                id: *id,
                num: *num,
                research: *research,
                prompt: prompt.clone().unwrap_or_default(),
            };
            expand::run(ctx, &opts, &files.file).await
        }
        Command::Analyze { id, research, output, files } => {
            analyze::run(ctx, *id, *research, output, &files.file).await
        }
        Command::Elaborate { id, research, files } => {
            elaborate::run(ctx, *id, *research, &files.file).await
        }
    }
}

/// Loads the tasks file and clones the task with `id`.
fn load_task(ctx: &ServiceContext, tasks_path: &Path, id: u32) -> Result<(TasksFile, Task)> {
    let file = TaskStore::new(ctx, tasks_path).load()?;
    let task = file
        .task(id)
        .cloned()
        .ok_or_else(|| Error::Store(format!("Task {id} not found in {}", tasks_path.display())))?;
    Ok((file, task))
}

/// Finish a recording session and print the cassette path.
fn finish_recording(session: RecordingSession) -> std::result::Result<(), String> {
    let path: PathBuf = session.finish().map_err(|e| e.user_message())?;
    eprintln!("Recording saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use chrono::Utc;
    use serde_json::{json, Value};

    use crate::cassette::format::{Cassette, Interaction};
    use crate::config::Config;
    use crate::context::ServiceContext;

    /// Replaying context over `(port, method, output)` triples, on real disk.
    pub fn replay_context(outputs: Vec<(&str, &str, Value)>) -> ServiceContext {
        let interactions = outputs
            .into_iter()
            .zip(0..)
            .map(|((port, method, output), seq)| Interaction {
                seq,
                port: port.into(),
                method: method.into(),
                input: json!({}),
                output,
            })
            .collect();
        let cassette =
            Cassette { name: "commands".into(), recorded_at: Utc::now(), model: String::new(), interactions };
        ServiceContext::replaying_cassette(&cassette, Config::default())
    }

    /// Fresh scratch directory under the system temp dir.
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tasksmith_cmd_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes a two-task tasks file and returns its path.
    pub fn seed_tasks(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("tasks.json");
        let file = json!({
            "tasks": [
                {"id": 1, "title": "Set up project", "status": "done", "priority": "high"},
                {
                    "id": 2,
                    "title": "Add login",
                    "description": "Email and password login",
                    "dependencies": [1],
                    "subtasks": [{"id": 1, "title": "Schema", "parentTaskId": 2}]
                }
            ],
            "metadata": {"projectName": "demo", "totalTasks": 2, "sourceFile": "prd.txt"}
        });
        std::fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();
        path
    }
}
