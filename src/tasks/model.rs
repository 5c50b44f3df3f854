//! Task, subtask and complexity report values exchanged with the pipeline.

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle state of a task or subtask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
    /// Waiting for review.
    Review,
    /// Postponed.
    Deferred,
    /// Dropped.
    Cancelled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Review => "review",
            Self::Deferred => "deferred",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Relative importance of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Blocks other work.
    High,
    /// The usual.
    #[default]
    Medium,
    /// Nice to have.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// A top-level unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Positive, unique within a tasks file.
    #[serde(deserialize_with = "positive_id")]
    pub id: u32,
    /// Short title.
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    /// One or two sentence summary.
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    /// Lifecycle state.
    #[serde(default, deserialize_with = "lenient_label")]
    pub status: TaskStatus,
    /// IDs of tasks that must finish first. Order is kept; duplicates are not removed.
    #[serde(default, deserialize_with = "dependency_ids")]
    pub dependencies: Vec<u32>,
    /// Relative importance.
    #[serde(default, deserialize_with = "lenient_label")]
    pub priority: Priority,
    /// Implementation notes.
    #[serde(default, deserialize_with = "lenient_text")]
    pub details: String,
    /// How to verify the task.
    #[serde(default, deserialize_with = "lenient_text")]
    pub test_strategy: String,
    /// Subtasks, numbered from 1 within this task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Next free subtask number (one past the highest existing one).
    #[must_use]
    pub fn next_subtask_id(&self) -> u32 {
        self.subtasks.iter().map(|s| s.id).max().unwrap_or(0).saturating_add(1)
    }
}

/// A unit of work scoped under one parent task.
///
/// `parent_task_id` identifies the parent by value; the subtask's full
/// identifier is `<parent_task_id>.<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Position-derived number within the parent.
    pub id: u32,
    /// Short title.
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    /// Summary.
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    /// Implementation notes.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// Lifecycle state.
    #[serde(default, deserialize_with = "lenient_label")]
    pub status: TaskStatus,
    /// Plain integer dependency IDs.
    #[serde(default, deserialize_with = "dependency_ids")]
    pub dependencies: Vec<u32>,
    /// ID of the owning task.
    #[serde(default)]
    pub parent_task_id: u32,
}

impl Subtask {
    /// Stand-in used when model output cannot be turned into subtasks.
    #[must_use]
    pub fn placeholder(id: u32, position: usize, parent_task_id: u32) -> Self {
        Self {
            id,
            title: format!("Subtask {}", position + 1),
            description: "Auto-generated fallback subtask".to_string(),
            details: String::new(),
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            parent_task_id,
        }
    }

    /// Full dotted identifier, e.g. `5.2`.
    #[must_use]
    pub fn dotted_id(&self) -> String {
        format!("{}.{}", self.parent_task_id, self.id)
    }
}

/// Scored assessment of how hard one task is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReport {
    /// Analyzed task, always taken from the caller.
    #[serde(default)]
    pub task_id: u32,
    /// 1 (trivial) to 10 (very hard), as reported by the model.
    pub complexity_score: u32,
    /// Narrative assessment.
    #[serde(default)]
    pub analysis: String,
    /// Rough effort estimate.
    #[serde(default)]
    pub time_estimate: String,
    /// Suggested subtask count, 2 to 10.
    #[serde(default)]
    pub recommended_subtasks: u32,
    /// Why that many subtasks.
    #[serde(default)]
    pub subtask_recommendation: String,
    /// Things that could go wrong.
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Suggested way to tackle the task.
    #[serde(default)]
    pub recommended_approach: String,
    /// Prompt to feed subtask expansion.
    #[serde(default)]
    pub expansion_prompt: String,
}

/// Metadata stored next to generated tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksMetadata {
    /// Project name.
    #[serde(default)]
    pub project_name: String,
    /// Number of tasks in the file.
    #[serde(default)]
    pub total_tasks: usize,
    /// PRD the tasks came from.
    #[serde(default)]
    pub source_file: String,
    /// RFC 3339 generation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// Contents of `tasks.json`, also the result of PRD decomposition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksFile {
    /// All top-level tasks.
    pub tasks: Vec<Task>,
    /// Generation metadata.
    #[serde(default)]
    pub metadata: TasksMetadata,
}

impl TasksFile {
    /// Looks up a task by ID.
    #[must_use]
    pub fn task(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Looks up a task by ID for modification.
    pub fn task_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// Coerces one dependency reference to a plain integer ID.
///
/// Numbers and numeric strings (`"3"`, `" 4 "`, `"5.0"`) are accepted; anything
/// that is not a finite positive integer yields `None`.
#[must_use]
pub fn coerce_dependency(value: &serde_json::Value) -> Option<u32> {
    let id = match value {
        serde_json::Value::Number(n) => {
            n.as_u64().or_else(|| n.as_f64().and_then(whole)).and_then(|id| u32::try_from(id).ok())
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
                .and_then(|id| u32::try_from(id).ok())
        }
        _ => None,
    };
    id.filter(|id| *id > 0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn whole(f: f64) -> Option<u64> {
    (f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64).then(|| f as u64)
}

/// Coerces a dependency list, dropping entries that are not integer IDs.
#[must_use]
pub fn coerce_dependencies(values: &[serde_json::Value]) -> Vec<u32> {
    values.iter().filter_map(coerce_dependency).collect()
}

fn dependency_ids<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(coerce_dependencies).unwrap_or_default())
}

/// Task IDs accept the same shapes as dependency references.
fn positive_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    coerce_dependency(&raw).ok_or_else(|| D::Error::custom(format!("invalid id {raw}")))
}

/// Status and priority labels: case-insensitive, unknown or mistyped values fall back to the default.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(label)) => {
            let label = serde_json::Value::String(label.trim().to_lowercase());
            serde_json::from_value(label).unwrap_or_default()
        }
        _ => T::default(),
    })
}

/// Free text; numbers and booleans are rendered, other shapes become empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => text,
        Some(value @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => value.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_deserializes_camel_case_with_defaults() {
        let task: Task = serde_json::from_value(json!({
            "id": 3,
            "title": "Set up CI",
            "testStrategy": "pipeline is green",
            "dependencies": [1, "2"],
            "priority": "high"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.dependencies, vec![1, 2]);
        assert_eq!(task.test_strategy, "pipeline is green");
        assert!(task.subtasks.is_empty());
    }

    #[test]
    fn null_dependencies_become_empty() {
        let task: Task =
            serde_json::from_value(json!({"id": 1, "title": "x", "dependencies": null})).unwrap();
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn coercion_keeps_order_duplicates_and_drops_garbage() {
        let deps = coerce_dependencies(&[
            json!(2),
            json!("1"),
            json!(" 7 "),
            json!("2"),
            json!("abc"),
            json!(1.5),
            json!(-3),
            json!(null),
            json!("4.0"),
        ]);
        assert_eq!(deps, vec![2, 1, 7, 2, 4]);
    }

    #[test]
    fn coercion_is_idempotent() {
        let once = coerce_dependencies(&[json!("3"), json!(5), json!("x")]);
        let as_values: Vec<serde_json::Value> = once.iter().map(|d| json!(d)).collect();
        assert_eq!(coerce_dependencies(&as_values), once);
    }

    #[test]
    fn placeholder_and_dotted_id() {
        let sub = Subtask::placeholder(4, 1, 9);
        assert_eq!(sub.title, "Subtask 2");
        assert_eq!(sub.description, "Auto-generated fallback subtask");
        assert_eq!(sub.dotted_id(), "9.4");
    }

    #[test]
    fn next_subtask_id_follows_highest() {
        let mut task: Task = serde_json::from_value(json!({"id": 2, "title": "t"})).unwrap();
        assert_eq!(task.next_subtask_id(), 1);
        task.subtasks = vec![Subtask::placeholder(1, 0, 2), Subtask::placeholder(5, 1, 2)];
        assert_eq!(task.next_subtask_id(), 6);
    }

    #[test]
    fn next_subtask_id_saturates_at_max() {
        let mut task: Task = serde_json::from_value(json!({"id": 2, "title": "t"})).unwrap();
        task.subtasks = vec![Subtask::placeholder(u32::MAX, 0, 2)];
        assert_eq!(task.next_subtask_id(), u32::MAX);
    }

    #[test]
    fn off_schema_labels_fall_back_to_defaults() {
        let task: Task = serde_json::from_value(json!({
            "id": "4",
            "title": "Ship it",
            "status": "todo",
            "priority": "critical"
        }))
        .unwrap();
        assert_eq!(task.id, 4);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::Medium);

        let task: Task =
            serde_json::from_value(json!({"id": 5, "title": "x", "status": "Done", "priority": " HIGH "}))
                .unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn mistyped_text_fields_do_not_reject_the_subtask() {
        let sub: Subtask = serde_json::from_value(json!({
            "id": 1,
            "title": 42,
            "description": {"text": "nested"},
            "status": 3
        }))
        .unwrap();
        assert_eq!(sub.title, "42");
        assert_eq!(sub.description, "");
        assert_eq!(sub.status, TaskStatus::Pending);
    }

    #[test]
    fn unusable_task_id_is_still_rejected() {
        assert!(serde_json::from_value::<Task>(json!({"id": "abc", "title": "x"})).is_err());
        assert!(serde_json::from_value::<Task>(json!({"title": "x"})).is_err());
    }

    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), json!("in-progress"));
        assert_eq!(TaskStatus::InProgress.to_string(), "in-progress");
    }
}
