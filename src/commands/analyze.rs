//! `tasksmith analyze` command.

use std::path::Path;

use super::load_task;
use crate::context::ServiceContext;
use crate::error::Result;
use crate::pipeline;
use crate::tasks::ReportStore;

/// Scores one task and merges the result into the complexity report at `report_path`.
///
/// # Errors
///
/// Returns an error if the task is unknown, analysis fails, or the report
/// cannot be updated.
pub async fn run(
    ctx: &ServiceContext,
    id: u32,
    research: bool,
    report_path: &Path,
    tasks_path: &Path,
) -> Result<()> {
    let (file, task) = load_task(ctx, tasks_path, id)?;
    let report = pipeline::analyze_complexity(ctx, &task, research).await?;

    let project_name = if file.metadata.project_name.is_empty() {
        ctx.config.project_name.as_str()
    } else {
        file.metadata.project_name.as_str()
    };
    ReportStore::new(ctx, report_path).record(report.clone(), project_name, ctx.clock.now())?;

    println!(
        "Task {id}: complexity {}/10, {} subtasks recommended",
        report.complexity_score, report.recommended_subtasks
    );
    if !report.time_estimate.is_empty() {
        println!("Estimate: {}", report.time_estimate);
    }
    if !report.analysis.is_empty() {
        println!("\n{}", report.analysis);
    }
    println!("\nReport updated: {}", report_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{replay_context, scratch_dir, seed_tasks};
    use crate::error::Error;
    use serde_json::json;

    #[tokio::test]
    async fn records_report_keyed_by_task() {
        let dir = scratch_dir("analyze_records");
        let path = seed_tasks(&dir);
        let report_path = dir.join("scripts/report.json");
        let ctx = replay_context(vec![
            ("llm", "complete", json!({"ok": {"text": "{\"complexityScore\": 7, \"recommendedSubtasks\": 5}"}})),
            ("llm", "complete", json!({"ok": {"text": "{\"complexityScore\": 3}"}})),
        ]);

        run(&ctx, 2, false, &report_path, &path).await.unwrap();
        run(&ctx, 2, false, &report_path, &path).await.unwrap();

        let file = ReportStore::new(&ctx, &report_path).load().unwrap();
        assert_eq!(file.complexity_analysis.len(), 1);
        assert_eq!(file.complexity_analysis[0].task_id, 2);
        assert_eq!(file.complexity_analysis[0].complexity_score, 3);
        assert_eq!(file.meta.project_name, "demo");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unusable_analysis_leaves_report_untouched() {
        let dir = scratch_dir("analyze_unusable");
        let path = seed_tasks(&dir);
        let report_path = dir.join("report.json");
        let ctx = replay_context(vec![
            ("llm", "complete", json!({"ok": {"text": "hard to say"}})),
            ("llm", "complete", json!({"ok": {"text": "{\"analysis\": \"no score\"}"}})),
            ("llm", "complete", json!({"ok": {"text": "still hard to say"}})),
        ]);

        let err = run(&ctx, 1, false, &report_path, &path).await.unwrap_err();
        assert_eq!(err, Error::NoJsonFound);
        assert!(!report_path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
