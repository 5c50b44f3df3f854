//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default location of the tasks file.
pub const DEFAULT_TASKS_FILE: &str = "tasks/tasks.json";

/// Default location of the complexity report.
pub const DEFAULT_REPORT_FILE: &str = "scripts/task-complexity-report.json";

/// Top-level CLI parser for `tasksmith`.
#[derive(Debug, Parser)]
#[command(
    name = "tasksmith",
    version,
    about = "Turn product requirements into development tasks with an LLM"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct FileArgs {
    /// Path to the tasks file.
    #[arg(short, long, default_value = DEFAULT_TASKS_FILE)]
    pub file: PathBuf,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate tasks from a product requirements document.
    ParsePrd {
        /// Path to the PRD text file.
        prd: PathBuf,
        /// Number of tasks to generate.
        #[arg(short, long, default_value_t = 10)]
        num_tasks: usize,
        #[command(flatten)]
        files: FileArgs,
    },
    /// List tasks and their subtasks.
    List {
        #[command(flatten)]
        files: FileArgs,
    },
    /// Break a task into subtasks.
    Expand {
        /// ID of the task to expand.
        #[arg(short, long)]
        id: u32,
        /// Number of subtasks (defaults to `DEFAULT_SUBTASKS`).
        #[arg(short, long)]
        num: Option<usize>,
        /// Consult the research provider and append to existing subtasks.
        #[arg(short, long)]
        research: bool,
        /// Extra guidance for the model.
        #[arg(short, long)]
        prompt: Option<String>,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Score a task's complexity and record it in the report.
    Analyze {
        /// ID of the task to analyze.
        #[arg(short, long)]
        id: u32,
        /// Consult the research provider first.
        #[arg(short, long)]
        research: bool,
        /// Path to the complexity report.
        #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,
        #[command(flatten)]
        files: FileArgs,
    },
    /// Print a Markdown implementation brief for a task.
    Elaborate {
        /// ID of the task to elaborate.
        #[arg(short, long)]
        id: u32,
        /// Consult the research provider first.
        #[arg(short, long)]
        research: bool,
        #[command(flatten)]
        files: FileArgs,
    },
}
