//! Task store: persistence for `tasks.json` and the complexity report.
//!
//! All I/O goes through `ctx.fs` so that the store works with live,
//! replaying, and recording adapters alike.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{ComplexityReport, TasksFile};
use crate::context::ServiceContext;
use crate::error::{Error, Result};

/// Reads and writes the tasks file.
pub struct TaskStore<'a> {
    ctx: &'a ServiceContext,
    path: PathBuf,
}

impl<'a> TaskStore<'a> {
    /// Creates a store for the tasks file at `path`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, path: &Path) -> Self {
        Self { ctx, path: path.to_path_buf() }
    }

    /// Loads the tasks file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the file is missing or unparseable.
    pub fn load(&self) -> Result<TasksFile> {
        if !self.ctx.fs.exists(&self.path) {
            return Err(Error::Store(format!(
                "Tasks file not found at {}. Run `tasksmith parse-prd <file>` first.",
                self.path.display()
            )));
        }
        let contents = self.ctx.fs.read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::Store(format!("Failed to parse tasks file {}: {e}", self.path.display()))
        })
    }

    /// Writes the tasks file as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, file: &TasksFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)
            .map_err(|e| Error::Store(format!("Failed to serialize tasks: {e}")))?;
        self.ctx.fs.write(&self.path, &json)?;
        debug!(path = %self.path.display(), tasks = file.tasks.len(), "tasks file written");
        Ok(())
    }
}

/// Header of the complexity report file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// When the report was last updated (RFC 3339).
    #[serde(default)]
    pub generated_at: String,
    /// Number of analyses in the report.
    #[serde(default)]
    pub tasks_analyzed: usize,
    /// Project the tasks belong to.
    #[serde(default)]
    pub project_name: String,
}

/// Contents of the complexity report file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReportFile {
    /// Report header.
    #[serde(default)]
    pub meta: ReportMeta,
    /// One analysis per task, ordered by task ID.
    #[serde(default)]
    pub complexity_analysis: Vec<ComplexityReport>,
}

impl ComplexityReportFile {
    /// Inserts `report`, replacing an earlier analysis of the same task.
    pub fn upsert(&mut self, report: ComplexityReport) {
        match self.complexity_analysis.iter_mut().find(|r| r.task_id == report.task_id) {
            Some(existing) => *existing = report,
            None => self.complexity_analysis.push(report),
        }
        self.complexity_analysis.sort_by_key(|r| r.task_id);
        self.meta.tasks_analyzed = self.complexity_analysis.len();
    }
}

/// Reads and writes the complexity report.
pub struct ReportStore<'a> {
    ctx: &'a ServiceContext,
    path: PathBuf,
}

impl<'a> ReportStore<'a> {
    /// Creates a store for the report at `path`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, path: &Path) -> Self {
        Self { ctx, path: path.to_path_buf() }
    }

    /// Loads the report, or an empty one when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when an existing file cannot be parsed.
    pub fn load(&self) -> Result<ComplexityReportFile> {
        if !self.ctx.fs.exists(&self.path) {
            return Ok(ComplexityReportFile::default());
        }
        let contents = self.ctx.fs.read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::Store(format!("Failed to parse complexity report {}: {e}", self.path.display()))
        })
    }

    /// Adds `report` to the file on disk and refreshes its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing report cannot be read or the write fails.
    pub fn record(
        &self,
        report: ComplexityReport,
        project_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ComplexityReportFile> {
        let mut file = self.load()?;
        file.upsert(report);
        file.meta.generated_at = now.to_rfc3339();
        file.meta.project_name = project_name.to_string();

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::Store(format!("Failed to serialize complexity report: {e}")))?;
        self.ctx.fs.write(&self.path, &json)?;
        Ok(file)
    }
}
