//! Request packaging and response validation for the prioritization model

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Priority, Task};

use super::error::PrioritizationFailure;

/// One task as the model sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestTask {
    pub title: String,
    /// Empty when the task has no description
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

/// Everything the model needs to rank a project's open tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrioritizationRequest {
    pub project_goals: String,
    pub tasks: Vec<RequestTask>,
}

/// A single priority assignment returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedTask {
    pub title: String,
    pub priority: Priority,
    pub reason: String,
}

/// The model's validated answer, in the order it was given
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrioritizationResult {
    pub entries: Vec<PrioritizedTask>,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    #[serde(rename = "prioritizedTasks")]
    prioritized_tasks: Vec<PrioritizedTask>,
}

/// Package open tasks and the project goal into a model request
///
/// Input order is preserved. Tasks with a blank title are skipped.
pub fn build_request(tasks: &[Task], goal: &str) -> Result<PrioritizationRequest, PrioritizationFailure> {
    debug!(task_count = tasks.len(), "build_request: called");

    let entries: Vec<RequestTask> = tasks
        .iter()
        .filter(|task| {
            let blank = task.title.trim().is_empty();
            if blank {
                warn!(task_id = %task.id, "build_request: skipping task with blank title");
            }
            !blank
        })
        .map(|task| RequestTask {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            deadline: task.deadline.clone(),
        })
        .collect();

    if entries.is_empty() {
        debug!("build_request: no usable tasks");
        return Err(PrioritizationFailure::NoWorkToDo);
    }

    Ok(PrioritizationRequest {
        project_goals: goal.to_string(),
        tasks: entries,
    })
}

/// Validate raw model output against the expected shape
///
/// A surrounding Markdown code fence is tolerated and extra fields are
/// ignored. A single bad entry rejects the whole response.
pub fn parse_result(raw: &str) -> Result<PrioritizationResult, PrioritizationFailure> {
    debug!(raw_len = raw.len(), "parse_result: called");
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(PrioritizationFailure::MalformedModelResponse(
            "empty response".to_string(),
        ));
    }

    let envelope: ResponseEnvelope = serde_json::from_str(body).map_err(|e| {
        debug!(error = %e, "parse_result: shape mismatch");
        PrioritizationFailure::MalformedModelResponse(e.to_string())
    })?;

    debug!(entry_count = envelope.prioritized_tasks.len(), "parse_result: parsed");
    Ok(PrioritizationResult {
        entries: envelope.prioritized_tasks,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str) -> Task {
        Task::new(title, "p1")
    }

    #[test]
    fn test_build_request_preserves_order_and_defaults() {
        let tasks = vec![
            task("Write docs").with_description("User guide"),
            task("Fix login").with_deadline("2026-11-01"),
        ];

        let request = build_request(&tasks, "Ship v1").unwrap();

        assert_eq!(request.project_goals, "Ship v1");
        assert_eq!(
            request.tasks,
            vec![
                RequestTask {
                    title: "Write docs".to_string(),
                    description: "User guide".to_string(),
                    deadline: None,
                },
                RequestTask {
                    title: "Fix login".to_string(),
                    description: String::new(),
                    deadline: Some("2026-11-01".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_build_request_empty_is_no_work() {
        let result = build_request(&[], "Ship v1");
        assert!(matches!(result, Err(PrioritizationFailure::NoWorkToDo)));
    }

    #[test]
    fn test_build_request_skips_blank_titles() {
        let tasks = vec![task("   "), task("Real task")];
        let request = build_request(&tasks, "goal").unwrap();
        assert_eq!(request.tasks.len(), 1);
        assert_eq!(request.tasks[0].title, "Real task");

        let only_blank = vec![task("")];
        assert!(matches!(
            build_request(&only_blank, "goal"),
            Err(PrioritizationFailure::NoWorkToDo)
        ));
    }

    #[test]
    fn test_request_serializes_without_missing_deadline() {
        let request = build_request(&[task("A")], "goal").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["project_goals"], "goal");
        assert_eq!(json["tasks"][0]["description"], "");
        assert!(json["tasks"][0].get("deadline").is_none());
    }

    #[test]
    fn test_parse_result_valid() {
        let raw = r#"{"prioritizedTasks":[
            {"title":"A","priority":"High","reason":"r1"},
            {"title":"B","priority":"Low","reason":"r2"}
        ]}"#;

        let result = parse_result(raw).unwrap();
        assert_eq!(
            result.entries,
            vec![
                PrioritizedTask {
                    title: "A".to_string(),
                    priority: Priority::High,
                    reason: "r1".to_string(),
                },
                PrioritizedTask {
                    title: "B".to_string(),
                    priority: Priority::Low,
                    reason: "r2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_result_strips_code_fence() {
        let raw = "```json\n{\"prioritizedTasks\":[{\"title\":\"A\",\"priority\":\"Medium\",\"reason\":\"r\"}]}\n```\n";
        let result = parse_result(raw).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].priority, Priority::Medium);
    }

    #[test]
    fn test_parse_result_ignores_extra_fields() {
        let raw = r#"{"prioritizedTasks":[{"title":"A","priority":"Low","reason":"r","score":3}],"note":"x"}"#;
        assert_eq!(parse_result(raw).unwrap().entries.len(), 1);
    }

    #[test]
    fn test_parse_result_empty_list_is_valid() {
        assert!(parse_result(r#"{"prioritizedTasks":[]}"#).unwrap().entries.is_empty());
    }

    #[test]
    fn test_parse_result_rejects_bad_shapes() {
        let bad = [
            "",
            "not json",
            r#"{"tasks":[]}"#,
            r#"{"prioritizedTasks":{}}"#,
            r#"{"prioritizedTasks":[{"title":"A","priority":"Urgent","reason":"r"}]}"#,
            r#"{"prioritizedTasks":[{"title":"A","priority":"high","reason":"r"}]}"#,
            r#"{"prioritizedTasks":[{"title":"A","priority":"High"}]}"#,
            r#"{"prioritizedTasks":[{"title":1,"priority":"High","reason":"r"}]}"#,
            // One bad entry poisons the whole response
            r#"{"prioritizedTasks":[{"title":"A","priority":"High","reason":"r"},{"title":"B"}]}"#,
        ];

        for raw in bad {
            assert!(
                matches!(parse_result(raw), Err(PrioritizationFailure::MalformedModelResponse(_))),
                "expected malformed for {raw:?}"
            );
        }
    }
}
