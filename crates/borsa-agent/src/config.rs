//! Orchestrator configuration
//!
//! Tuning knobs for the pipeline: model selection per stage, step budgets
//! and per-stage timeouts. Defaults match the values the agent was tuned
//! with in production.

use std::time::Duration;

/// Default global step budget for a single run.
pub const DEFAULT_MAX_STEPS: usize = 20;

/// Default number of act/validate iterations allowed per task.
pub const DEFAULT_MAX_STEPS_PER_TASK: usize = 5;

/// Model assignments per pipeline stage
///
/// Planning gets the strongest model since task decomposition quality
/// dominates the run. The remaining stages use a faster model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model for the routing decision
    pub routing: String,

    /// Model for task planning
    pub planning: String,

    /// Model for task execution (tool calling)
    pub action: String,

    /// Model for task validation
    pub validation: String,

    /// Model for answer synthesis
    pub synthesis: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let fast = "google/gemini-2.5-flash-preview-09-2025".to_string();
        Self {
            routing: fast.clone(),
            planning: "google/gemini-2.5-pro".to_string(),
            action: fast.clone(),
            validation: fast.clone(),
            synthesis: fast,
        }
    }
}

/// Per-stage timeouts
///
/// A stage that exceeds its timeout degrades instead of failing the run:
/// routing falls through to planning, planning falls through to synthesis,
/// validation counts the task as done.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub route: Duration,
    pub plan: Duration,
    pub act: Duration,
    pub validate: Duration,
    pub synthesize: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            route: Duration::from_secs(25),
            plan: Duration::from_secs(60),
            act: Duration::from_secs(120),
            validate: Duration::from_secs(30),
            synthesize: Duration::from_secs(90),
        }
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Global step budget across all tasks in a run
    pub max_steps: usize,

    /// Act/validate iteration cap per task
    pub max_steps_per_task: usize,

    /// Run independent tasks of a level concurrently
    pub parallel: bool,

    /// Emit verbose progress output
    pub debug: bool,

    /// Model assignments per stage
    pub models: ModelConfig,

    /// Per-stage timeouts
    pub timeouts: Timeouts,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_steps_per_task: DEFAULT_MAX_STEPS_PER_TASK,
            parallel: true,
            debug: false,
            models: ModelConfig::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the per-task iteration cap
    pub fn with_max_steps_per_task(mut self, max_steps_per_task: usize) -> Self {
        self.max_steps_per_task = max_steps_per_task;
        self
    }

    /// Enable or disable parallel level execution
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable verbose progress output
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override model assignments
    pub fn with_models(mut self, models: ModelConfig) -> Self {
        self.models = models;
        self
    }

    /// Override stage timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_steps, 20);
        assert_eq!(config.max_steps_per_task, 5);
        assert!(config.parallel);
        assert!(!config.debug);
        assert_eq!(config.models.planning, "google/gemini-2.5-pro");
    }

    #[test]
    fn builder_overrides() {
        let config = OrchestratorConfig::new()
            .with_max_steps(8)
            .with_max_steps_per_task(2)
            .with_parallel(false)
            .with_debug(true);
        assert_eq!(config.max_steps, 8);
        assert_eq!(config.max_steps_per_task, 2);
        assert!(!config.parallel);
        assert!(config.debug);
    }
}
