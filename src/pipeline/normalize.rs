//! Parsing extracted JSON and enforcing per-call-site shape contracts.

use serde_json::Value;
use tracing::{debug, warn};

use super::extract::{extract_json, JsonShape};
use crate::error::{Error, Result};
use crate::tasks::{ComplexityReport, Subtask, Task, TasksFile};

/// Parses an extracted candidate.
///
/// # Errors
///
/// Returns [`Error::MalformedJson`] when the candidate is not valid JSON.
pub fn parse_candidate(candidate: &str) -> Result<Value> {
    serde_json::from_str(candidate).map_err(|e| Error::MalformedJson(e.to_string()))
}

/// Checks a PRD decomposition: a `tasks` array plus a `metadata` object.
///
/// A task count different from `expected_count` is logged, not corrected.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when either member is missing or a task
/// cannot be read.
pub fn validate_prd_response(value: Value, expected_count: usize) -> Result<TasksFile> {
    let Value::Object(mut root) = value else {
        return Err(Error::ShapeMismatch("expected a JSON object with tasks and metadata".into()));
    };
    let tasks = match root.remove("tasks") {
        Some(Value::Array(tasks)) => tasks,
        _ => return Err(Error::ShapeMismatch("response has no `tasks` array".into())),
    };
    let metadata = match root.remove("metadata") {
        Some(metadata @ Value::Object(_)) => metadata,
        _ => return Err(Error::ShapeMismatch("response has no `metadata` object".into())),
    };

    let tasks = tasks
        .into_iter()
        .map(serde_json::from_value::<Task>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::ShapeMismatch(format!("invalid task: {e}")))?;
    let metadata = serde_json::from_value(metadata)
        .map_err(|e| Error::ShapeMismatch(format!("invalid metadata: {e}")))?;

    if tasks.len() != expected_count {
        warn!(expected = expected_count, actual = tasks.len(), "model returned a different number of tasks");
    }
    Ok(TasksFile { tasks, metadata })
}

/// Normalizes a model-produced subtask array for `parent_task_id`.
///
/// Every element's ID is overwritten with its position (`<parent>.<index+1>`),
/// whatever the model returned. A length other than `expected` is logged.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when the value is not an array of objects.
pub fn normalize_subtask_array(
    value: Value,
    parent_task_id: u32,
    expected: usize,
) -> Result<Vec<Subtask>> {
    let Value::Array(items) = value else {
        return Err(Error::ShapeMismatch("expected a JSON array of subtasks".into()));
    };
    if items.len() != expected {
        warn!(expected, actual = items.len(), parent_task_id, "model returned a different number of subtasks");
    }
    renumber(items, 1, parent_task_id)
}

/// Turns raw model text into subtasks, never failing.
///
/// On any extraction, parse or shape problem (and for empty input) the result is
/// exactly `num_subtasks` placeholders numbered from `start_id`. Otherwise every
/// element is renumbered from `start_id`, tagged with `parent_task_id`, and has
/// its dependencies coerced to plain integers.
#[must_use]
pub fn parse_subtasks_from_text(
    text: &str,
    start_id: u32,
    num_subtasks: usize,
    parent_task_id: u32,
) -> Vec<Subtask> {
    let parsed = extract_json(text, JsonShape::Array).and_then(parse_candidate).and_then(|value| {
        match value {
            Value::Array(items) if !items.is_empty() => renumber(items, start_id, parent_task_id),
            Value::Array(_) => Err(Error::ShapeMismatch("empty subtask array".into())),
            _ => Err(Error::ShapeMismatch("expected a JSON array of subtasks".into())),
        }
    });

    match parsed {
        Ok(subtasks) => {
            if subtasks.len() != num_subtasks {
                warn!(expected = num_subtasks, actual = subtasks.len(), parent_task_id, "subtask count differs from request");
            }
            subtasks
        }
        Err(e) => {
            warn!(parent_task_id, count = num_subtasks, "subtask output unusable, using placeholders");
            debug!(parent_task_id, error = %e, "subtask parse failure");
            fallback_subtasks(start_id, num_subtasks, parent_task_id)
        }
    }
}

/// `count` placeholder subtasks numbered from `start_id`.
#[must_use]
pub fn fallback_subtasks(start_id: u32, count: usize, parent_task_id: u32) -> Vec<Subtask> {
    (0..count).map(|i| Subtask::placeholder(offset_id(start_id, i), i, parent_task_id)).collect()
}

/// Reads a complexity assessment and attaches the caller's task ID.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when the value is not an object or lacks a score.
pub fn parse_complexity(value: Value, task_id: u32) -> Result<ComplexityReport> {
    if !value.is_object() {
        return Err(Error::ShapeMismatch("expected a JSON object with the analysis".into()));
    }
    let mut report: ComplexityReport = serde_json::from_value(value)
        .map_err(|e| Error::ShapeMismatch(format!("invalid complexity analysis: {e}")))?;
    report.task_id = task_id;
    Ok(report)
}

fn renumber(items: Vec<Value>, start_id: u32, parent_task_id: u32) -> Result<Vec<Subtask>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(mut fields) = item else {
                return Err(Error::ShapeMismatch(format!("subtask {} is not an object", i + 1)));
            };
            let id = offset_id(start_id, i);
            if let Some(original) = fields.get("id") {
                debug!(%original, id, "renumbering subtask");
            }
            fields.insert("id".into(), Value::from(id));
            fields.insert("parentTaskId".into(), Value::from(parent_task_id));
            serde_json::from_value(Value::Object(fields))
                .map_err(|e| Error::ShapeMismatch(format!("subtask {}: {e}", i + 1)))
        })
        .collect()
}

fn offset_id(start_id: u32, index: usize) -> u32 {
    start_id.saturating_add(u32::try_from(index).unwrap_or(u32::MAX))
}
