//! Prompt templates.
//!
//! Each builder interpolates caller data into a fixed template. The schema
//! text of a template is a constant and never depends on the interpolated values.

use std::fmt::Write as _;

use super::extract::JsonShape;
use crate::error::Error;
use crate::tasks::Task;

/// A system prompt paired with the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Instructions describing role and output format.
    pub system: String,
    /// The content to transform.
    pub user: String,
}

/// Shape of one task in a PRD decomposition.
pub const TASK_SCHEMA: &str = r#"{
  "tasks": [
    {
      "id": number,
      "title": string,
      "description": string,
      "status": "pending",
      "dependencies": number[],
      "priority": "high" | "medium" | "low",
      "details": string,
      "testStrategy": string
    }
  ],
  "metadata": {
    "projectName": string,
    "totalTasks": number,
    "sourceFile": string,
    "generatedAt": string
  }
}"#;

/// Shape of a subtask array.
pub const SUBTASK_SCHEMA: &str = r#"[
  {
    "id": number,
    "title": string,
    "description": string,
    "dependencies": number[],
    "details": string
  }
]"#;

/// Shape of a complexity assessment.
pub const COMPLEXITY_SCHEMA: &str = r#"{
  "complexityScore": number (1-10),
  "analysis": string,
  "timeEstimate": string,
  "recommendedSubtasks": number (2-10),
  "subtaskRecommendation": string,
  "riskFactors": string[],
  "recommendedApproach": string,
  "expansionPrompt": string
}"#;

const PRD_SYSTEM: &str = "You are an AI assistant helping to break down a Product Requirements \
Document (PRD) into a set of sequential development tasks. Your goal is to create well-structured, \
actionable tasks that cover the full scope of the PRD.

Each task must follow this JSON structure:";

const PRD_RULES: &str = "Guidelines:
1. Create exactly the requested number of tasks, numbered from 1.
2. Each task should be atomic and focused on a single responsibility.
3. Order tasks logically: setup and core functionality first, then advanced features.
4. A task may only depend on tasks with lower IDs.
5. Include a concrete implementation approach in \"details\" and a validation approach in \"testStrategy\".
6. Assign priority (high/medium/low) from criticality and dependency order.

Respond ONLY with the JSON object, without explanation or Markdown fences.";

const SUBTASK_SYSTEM: &str = "You are an AI assistant helping with task breakdown for software \
development. Break the given task into specific, actionable subtasks that a developer can \
implement one after another.

Return the subtasks as a JSON array with this structure:";

const SUBTASK_RULES: &str = "Guidelines:
1. Each subtask is a concrete step of roughly 1-4 hours of work.
2. Subtasks follow a logical implementation order.
3. A subtask may only depend on subtasks with lower IDs.
4. Cover the whole parent task without overlapping each other.

Respond ONLY with the JSON array, without explanation or Markdown fences.";

const COMPLEXITY_SYSTEM: &str = "You are an expert software architect assessing how difficult a \
development task is. Consider implementation effort, technical risk, dependencies and testing \
needs.

Respond with a single JSON object with this structure:";

const ELABORATE_SYSTEM: &str = "You are a senior engineer writing an implementation brief for a \
development task. Write clear Markdown with the sections: Overview, Implementation Steps, \
Edge Cases, Testing. Do not wrap the answer in a code fence.";

const RESEARCH_SYSTEM: &str = "You are a technical researcher. Summarize current best practices, \
recommended libraries with versions, and known pitfalls relevant to the task. Be concise and \
concrete.";

const REPAIR_SYSTEM: &str = "You fix malformed JSON. Reply with corrected JSON only: no prose, \
no Markdown fences.";

/// PRD decomposition into `num_tasks` tasks.
#[must_use]
pub fn prd_prompt(prd: &str, num_tasks: usize, default_priority: &str) -> Prompt {
    let system = format!("{PRD_SYSTEM}\n{TASK_SCHEMA}\n\n{PRD_RULES}");
    let mut user = String::new();
    let _ = writeln!(
        user,
        "Generate exactly {num_tasks} tasks, with IDs 1 to {num_tasks}, from this PRD. \
         Use \"{default_priority}\" as the priority unless the PRD suggests otherwise.\n"
    );
    let _ = writeln!(user, "## PRD\n\n{prd}\n");
    let _ = write!(user, "Return JSON with \"tasks\" and \"metadata\".");
    Prompt { system, user }
}

/// Breakdown of `task` into `num_subtasks` subtasks numbered from `next_id`.
///
/// `context` carries free-form caller guidance and, for research-backed calls,
/// the research findings.
#[must_use]
pub fn subtasks_prompt(task: &Task, num_subtasks: usize, next_id: u32, context: &str) -> Prompt {
    let system = format!("{SUBTASK_SYSTEM}\n{SUBTASK_SCHEMA}\n\n{SUBTASK_RULES}");
    let last_id = next_id
        .saturating_add(u32::try_from(num_subtasks).unwrap_or(u32::MAX))
        .saturating_sub(1);

    let mut user = String::new();
    let _ = writeln!(
        user,
        "Break this task into exactly {num_subtasks} subtasks, with IDs {next_id} to {last_id}.\n"
    );
    write_task(&mut user, task);
    if !context.trim().is_empty() {
        let _ = writeln!(user, "\n## Additional Context\n\n{}", context.trim());
    }
    let _ = write!(user, "\nReturn a JSON array of exactly {num_subtasks} subtasks.");
    Prompt { system, user }
}

/// Complexity assessment of `task`.
#[must_use]
pub fn complexity_prompt(task: &Task, research: &str) -> Prompt {
    let system = format!(
        "{COMPLEXITY_SYSTEM}\n{COMPLEXITY_SCHEMA}\n\nRespond ONLY with the JSON object."
    );
    let mut user = String::from("Assess the complexity of this task.\n\n");
    write_task(&mut user, task);
    write_research(&mut user, research);
    Prompt { system, user }
}

/// Narrative implementation brief for `task`, returned as Markdown.
#[must_use]
pub fn elaborate_prompt(task: &Task, research: &str) -> Prompt {
    let mut user = String::from("Write an implementation brief for this task.\n\n");
    write_task(&mut user, task);
    write_research(&mut user, research);
    Prompt { system: ELABORATE_SYSTEM.to_string(), user }
}

/// Query sent to the research provider before generating or assessing `task`.
#[must_use]
pub fn research_prompt(task: &Task) -> Prompt {
    let mut user = String::from("Research implementation guidance for this development task.\n\n");
    write_task(&mut user, task);
    Prompt { system: RESEARCH_SYSTEM.to_string(), user }
}

/// Asks the model to correct its own output.
#[must_use]
pub fn repair_prompt(malformed: &str, error: &Error, schema: &str, shape: JsonShape) -> Prompt {
    let mut user = String::new();
    let _ = writeln!(
        user,
        "The following response was supposed to be a JSON {} but could not be used ({error}).\n",
        shape.describe()
    );
    let _ = writeln!(user, "## Response\n\n{malformed}\n");
    let _ = writeln!(user, "## Required Structure\n\n{schema}\n");
    let _ = write!(
        user,
        "Return the corrected JSON {} matching the required structure.",
        shape.describe()
    );
    Prompt { system: REPAIR_SYSTEM.to_string(), user }
}

fn write_task(out: &mut String, task: &Task) {
    let _ = writeln!(out, "## Task {}: {}\n", task.id, task.title);
    let _ = writeln!(out, "Description: {}", task.description);
    if !task.details.is_empty() {
        let _ = writeln!(out, "Details: {}", task.details);
    }
    if !task.test_strategy.is_empty() {
        let _ = writeln!(out, "Test strategy: {}", task.test_strategy);
    }
}

fn write_research(out: &mut String, research: &str) {
    if !research.trim().is_empty() {
        let _ = writeln!(out, "\n## Research Findings\n\n{}", research.trim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: u32, title: &str) -> Task {
        serde_json::from_value(json!({
            "id": id,
            "title": title,
            "description": "Persist sessions",
            "details": "Use SQLite"
        }))
        .unwrap()
    }

    /// The system prompt carries the schema; user content carries the values.
    fn schema_part(prompt: &Prompt) -> &str {
        &prompt.system
    }

    #[test]
    fn prd_prompt_embeds_content_and_count() {
        let prompt = prd_prompt("Build a todo app", 7, "high");
        assert!(prompt.user.contains("Build a todo app"));
        assert!(prompt.user.contains("exactly 7 tasks"));
        assert!(prompt.user.contains("\"high\""));
        assert!(prompt.system.contains(TASK_SCHEMA));
    }

    #[test]
    fn schema_portion_is_independent_of_values() {
        let a = prd_prompt("one", 3, "low");
        let b = prd_prompt("completely different PRD", 12, "high");
        assert_eq!(schema_part(&a), schema_part(&b));

        let c = subtasks_prompt(&task(1, "A"), 2, 1, "");
        let d = subtasks_prompt(&task(8, "B"), 6, 4, "focus on tests");
        assert_eq!(schema_part(&c), schema_part(&d));

        let e = complexity_prompt(&task(1, "A"), "");
        let f = complexity_prompt(&task(2, "B"), "findings");
        assert_eq!(schema_part(&e), schema_part(&f));
    }

    #[test]
    fn subtasks_prompt_states_id_range_and_context() {
        let prompt = subtasks_prompt(&task(5, "Auth"), 3, 4, "use OAuth");
        assert!(prompt.user.contains("IDs 4 to 6"));
        assert!(prompt.user.contains("## Task 5: Auth"));
        assert!(prompt.user.contains("Details: Use SQLite"));
        assert!(prompt.user.contains("use OAuth"));
    }

    #[test]
    fn empty_research_adds_no_section() {
        let prompt = complexity_prompt(&task(1, "A"), "  ");
        assert!(!prompt.user.contains("Research Findings"));
        let prompt = elaborate_prompt(&task(1, "A"), "prefer axum 0.7");
        assert!(prompt.user.contains("## Research Findings\n\nprefer axum 0.7"));
    }

    #[test]
    fn repair_prompt_carries_text_error_and_schema() {
        let prompt = repair_prompt(
            "[{\"id\": 1,]",
            &Error::MalformedJson("trailing comma".into()),
            SUBTASK_SCHEMA,
            JsonShape::Array,
        );
        assert!(prompt.user.contains("[{\"id\": 1,]"));
        assert!(prompt.user.contains("trailing comma"));
        assert!(prompt.user.contains(SUBTASK_SCHEMA));
        assert!(prompt.user.contains("JSON array"));
    }
}
