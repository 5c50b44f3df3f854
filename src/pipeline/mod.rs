//! Generation pipeline: prompt, provider call, extraction, validation.
//!
//! Every operation builds a prompt, sends it through [`retry::call_with_retry`]
//! and hands the text to the validator for its call site. Output problems are
//! repaired through the model where the call site demands structured data;
//! free-standing subtask generation falls back to placeholders instead.

pub mod extract;
pub mod normalize;
pub mod prompts;
pub mod retry;

use tracing::{debug, info, warn};

use crate::context::ServiceContext;
use crate::error::Result;
use crate::ports::llm::CompletionRequest;
use crate::tasks::{ComplexityReport, Subtask, Task, TasksFile};
use extract::{JsonShape, CLEANUP_PASSES};
use normalize::{normalize_subtask_array, parse_complexity, validate_prd_response};
use prompts::{Prompt, COMPLEXITY_SCHEMA, SUBTASK_SCHEMA, TASK_SCHEMA};
use retry::{call_with_retry, process_with_repair, CallMode, RepairTarget};

pub use normalize::parse_subtasks_from_text;

/// Inputs for [`generate_subtasks`].
#[derive(Debug, Clone, Default)]
pub struct SubtaskOptions {
    /// How many subtasks to ask for.
    pub num_subtasks: usize,
    /// Number given to the first generated subtask.
    pub next_id: u32,
    /// Free-form guidance added to the prompt.
    pub context: String,
    /// Whether to consult the research provider first.
    pub research: bool,
}

/// Decomposes a PRD into `num_tasks` tasks.
///
/// The response is streamed, then gets the full set of cleanup passes before
/// any repair round-trip. Metadata is completed from configuration and the clock.
///
/// # Errors
///
/// Returns the transport error once retries are spent, or the last output error
/// once cleanup and repair are exhausted.
pub async fn parse_prd(
    ctx: &ServiceContext,
    prd: &str,
    source_file: &str,
    num_tasks: usize,
) -> Result<TasksFile> {
    info!(source_file, num_tasks, "generating tasks from PRD");
    let prompt = prompts::prd_prompt(prd, num_tasks, &ctx.config.default_priority);
    let request = primary_request(ctx, prompt);
    let raw = call_with_retry(ctx.llm.as_ref(), &request, CallMode::Stream, &ctx.retry).await?;

    let policy = ctx.retry.with_cleanup_attempts(CLEANUP_PASSES);
    let target = RepairTarget { shape: JsonShape::Object, schema: TASK_SCHEMA };
    let mut file = process_with_repair(ctx.llm.as_ref(), &request, raw, target, &policy, |value| {
        validate_prd_response(value, num_tasks)
    })
    .await?;

    let metadata = &mut file.metadata;
    if metadata.project_name.trim().is_empty() {
        metadata.project_name.clone_from(&ctx.config.project_name);
    }
    metadata.total_tasks = file.tasks.len();
    metadata.source_file = source_file.to_string();
    metadata.generated_at = Some(ctx.clock.now().to_rfc3339());
    Ok(file)
}

/// Breaks `task` into subtasks, requiring usable model output.
///
/// Subtask numbers are positional (`1..=n`), whatever the model returned.
///
/// # Errors
///
/// Returns the transport error once retries are spent, or the last output error
/// once repair is exhausted.
pub async fn expand_task(
    ctx: &ServiceContext,
    task: &Task,
    num_subtasks: usize,
    extra_context: &str,
) -> Result<Vec<Subtask>> {
    info!(task_id = task.id, num_subtasks, "expanding task");
    let prompt = prompts::subtasks_prompt(task, num_subtasks, 1, extra_context);
    let request = primary_request(ctx, prompt);
    let raw = call_with_retry(ctx.llm.as_ref(), &request, CallMode::Stream, &ctx.retry).await?;

    let target = RepairTarget { shape: JsonShape::Array, schema: SUBTASK_SCHEMA };
    process_with_repair(ctx.llm.as_ref(), &request, raw, target, &ctx.retry, |value| {
        normalize_subtask_array(value, task.id, num_subtasks)
    })
    .await
}

/// Generates subtasks numbered from `opts.next_id`, never failing on bad output.
///
/// # Errors
///
/// Only transport errors from the primary provider, after retries, are returned.
/// Research failures are logged and the call continues without research.
pub async fn generate_subtasks(
    ctx: &ServiceContext,
    task: &Task,
    opts: &SubtaskOptions,
) -> Result<Vec<Subtask>> {
    info!(task_id = task.id, num_subtasks = opts.num_subtasks, research = opts.research, "generating subtasks");
    let mut context = opts.context.trim().to_string();
    if opts.research {
        let findings = research_context(ctx, task).await;
        if !findings.is_empty() {
            if !context.is_empty() {
                context.push_str("\n\n");
            }
            context.push_str("Research findings:\n");
            context.push_str(&findings);
        }
    }

    let prompt = prompts::subtasks_prompt(task, opts.num_subtasks, opts.next_id, &context);
    let request = primary_request(ctx, prompt);
    let raw = call_with_retry(ctx.llm.as_ref(), &request, CallMode::Complete, &ctx.retry).await?;
    Ok(parse_subtasks_from_text(&raw, opts.next_id, opts.num_subtasks, task.id))
}

/// Scores how hard `task` is to implement.
///
/// # Errors
///
/// Returns the transport error once retries are spent, or the last output error
/// once repair is exhausted.
pub async fn analyze_complexity(
    ctx: &ServiceContext,
    task: &Task,
    research: bool,
) -> Result<ComplexityReport> {
    info!(task_id = task.id, research, "analyzing task complexity");
    let findings = if research { research_context(ctx, task).await } else { String::new() };
    let request = primary_request(ctx, prompts::complexity_prompt(task, &findings));
    let raw = call_with_retry(ctx.llm.as_ref(), &request, CallMode::Complete, &ctx.retry).await?;

    let target = RepairTarget { shape: JsonShape::Object, schema: COMPLEXITY_SCHEMA };
    process_with_repair(ctx.llm.as_ref(), &request, raw, target, &ctx.retry, |value| {
        parse_complexity(value, task.id)
    })
    .await
}

/// Writes a Markdown implementation brief for `task`. The text is not parsed.
///
/// # Errors
///
/// Returns the transport error once retries are spent.
pub async fn elaborate_task(ctx: &ServiceContext, task: &Task, research: bool) -> Result<String> {
    info!(task_id = task.id, research, "elaborating task");
    let findings = if research { research_context(ctx, task).await } else { String::new() };
    let request = primary_request(ctx, prompts::elaborate_prompt(task, &findings));
    let text = call_with_retry(ctx.llm.as_ref(), &request, CallMode::Complete, &ctx.retry).await?;
    Ok(text.trim().to_string())
}

/// Research findings for `task`, or an empty string when research is unavailable.
async fn research_context(ctx: &ServiceContext, task: &Task) -> String {
    let client = match ctx.research.get() {
        Ok(client) => client,
        Err(e) => {
            warn!(task_id = task.id, "research unavailable, continuing without it");
            debug!(task_id = task.id, error = %e, "research client unavailable");
            return String::new();
        }
    };

    let prompt = prompts::research_prompt(task);
    let request = CompletionRequest {
        model: ctx.config.perplexity_model.clone(),
        system: Some(prompt.system),
        prompt: prompt.user,
        max_tokens: ctx.config.max_tokens,
        temperature: ctx.config.temperature,
    };
    match call_with_retry(client.as_ref(), &request, CallMode::Complete, &ctx.retry).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!(task_id = task.id, retryable = e.is_retryable(), "research call failed, continuing without it");
            debug!(task_id = task.id, error = %e, "research call failure");
            String::new()
        }
    }
}

fn primary_request(ctx: &ServiceContext, prompt: Prompt) -> CompletionRequest {
    CompletionRequest {
        model: ctx.config.model.clone(),
        system: Some(prompt.system),
        prompt: prompt.user,
        max_tokens: ctx.config.max_tokens,
        temperature: ctx.config.temperature,
    }
}
