//! Structured-output schemas shared by every agent
//!
//! These types are deserialized from model output, so every optional field
//! carries a serde default: a model that omits `depends_on` or `done` must
//! still produce a usable value.

use serde::{Deserialize, Serialize};

/// A single atomic task produced by the planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within one planning run
    pub id: u32,

    /// What the task should accomplish, in the user's language
    pub description: String,

    /// Suggested tool name, if the planner picked one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Ids of sibling tasks that must complete first
    #[serde(default)]
    pub depends_on: Vec<u32>,

    /// Completion flag, maintained by the execution loop
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// Create a task with no dependencies
    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            tool_name: None,
            depends_on: Vec::new(),
            done: false,
        }
    }

    /// Set the suggested tool name
    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Set the prerequisite task ids
    pub fn with_depends_on(mut self, depends_on: Vec<u32>) -> Self {
        self.depends_on = depends_on;
        self
    }
}

/// The planner's full output: tasks plus optional rationale
///
/// Immutable after creation; an empty task list means "answer from
/// conversation context, no new data needed".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    /// Planned tasks in declaration order
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Planner rationale, free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl TaskList {
    /// Create a task list from planned tasks
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            reasoning: None,
        }
    }

    /// True when the planner emitted no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Validation verdict for one task iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsDone {
    /// Whether the accumulated outputs satisfy the task
    pub done: bool,

    /// Free-text justification
    #[serde(default)]
    pub reason: String,

    /// Confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,
}

impl IsDone {
    /// Fallback verdict for a validator timeout
    ///
    /// Timeouts favor termination over another iteration, so the verdict
    /// is "done" at medium confidence.
    pub fn timeout_default() -> Self {
        Self {
            done: true,
            reason: "Doğrulama zaman aşımına uğradı, görev tamamlandı sayıldı".to_string(),
            confidence: 0.5,
        }
    }

    /// Fallback verdict for a validator error
    ///
    /// Errors favor one more attempt, bounded by the per-task cap.
    pub fn error_default() -> Self {
        Self {
            done: false,
            reason: "Doğrulama hatası, görev tekrar denenecek".to_string(),
            confidence: 0.3,
        }
    }
}

/// Routing decision for one user query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Whether the query can be answered without tool calls
    pub is_simple: bool,

    /// Confidence in [0, 1]; the simple path needs > 0.7
    #[serde(default)]
    pub confidence: f64,

    /// Direct answer, populated only when simple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Free-text rationale
    #[serde(default)]
    pub reasoning: String,

    /// Whether the query asks for a full value-investing analysis
    #[serde(default)]
    pub valuation: bool,
}

impl RouteDecision {
    /// Whether the orchestrator may skip planning and answer directly
    pub fn takes_simple_path(&self) -> bool {
        self.is_simple && self.confidence > 0.7 && self.answer.is_some()
    }
}

/// Final synthesized answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text in the user's language
    pub answer: String,

    /// Confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,

    /// Names of the tools whose outputs fed the answer
    #[serde(default)]
    pub data_sources: Vec<String>,

    /// Warnings to surface alongside the answer
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults_from_sparse_json() {
        // A planner may omit everything but id and description
        let task: Task = serde_json::from_str(r#"{"id": 3, "description": "THYAO fiyatı"}"#)
            .unwrap();
        assert_eq!(task.id, 3);
        assert!(task.depends_on.is_empty());
        assert!(task.tool_name.is_none());
        assert!(!task.done);
    }

    #[test]
    fn test_task_list_with_dependencies() {
        let json = r#"{
            "tasks": [
                {"id": 1, "description": "a"},
                {"id": 2, "description": "b", "depends_on": [1], "tool_name": "get_price"}
            ],
            "reasoning": "iki adım"
        }"#;
        let list: TaskList = serde_json::from_str(json).unwrap();
        assert_eq!(list.tasks.len(), 2);
        assert_eq!(list.tasks[1].depends_on, vec![1]);
        assert_eq!(list.tasks[1].tool_name.as_deref(), Some("get_price"));
        assert!(!list.is_empty());
    }

    #[test]
    fn test_empty_task_list() {
        let list: TaskList = serde_json::from_str(r#"{"tasks": []}"#).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_simple_path_gate() {
        let mut route = RouteDecision {
            is_simple: true,
            confidence: 0.95,
            answer: Some("Merhaba!".to_string()),
            reasoning: String::new(),
            valuation: false,
        };
        assert!(route.takes_simple_path());

        // Low confidence falls through to planning even when flagged simple
        route.confidence = 0.6;
        assert!(!route.takes_simple_path());

        // Missing answer also falls through
        route.confidence = 0.95;
        route.answer = None;
        assert!(!route.takes_simple_path());
    }

    #[test]
    fn test_isdone_fallbacks_are_asymmetric() {
        let timeout = IsDone::timeout_default();
        let error = IsDone::error_default();
        assert!(timeout.done);
        assert!(!error.done);
        assert!(timeout.confidence > error.confidence);
    }
}
