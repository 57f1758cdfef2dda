//! Dependency-aware task scheduling
//!
//! Tasks declare dependencies by id. The scheduler groups them into
//! levels using Kahn's algorithm: every task in a level only depends on
//! tasks from earlier levels, so a whole level can run concurrently.
//!
//! Execution consumes a global step budget where one step is one produced
//! output line. The budget is checked before each level; a task that fails
//! is converted into an error output so the rest of the plan keeps running.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use borsa_core::{Error, Result, Task};
use futures::future::join_all;
use tracing::{debug, warn};

/// Tasks grouped into sequential levels of independent work.
pub type ExecutionPlan = Vec<Vec<Task>>;

/// Runs a single task to completion, producing its output lines.
///
/// `budget_remaining` is the number of steps left in the global budget at
/// the time the task's level was dispatched. Implementations should not
/// produce more outputs than that.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run_task(&self, task: &Task, budget_remaining: usize) -> Result<Vec<String>>;
}

/// Outcome of executing a plan.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// All task outputs, in declared task order within each level
    pub outputs: Vec<String>,

    /// Steps consumed (one per output)
    pub steps: usize,

    /// Number of levels that ran to completion
    pub levels_completed: usize,

    /// True when execution stopped because the budget ran out
    pub budget_exhausted: bool,
}

impl ExecutionReport {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Group tasks into execution levels.
///
/// Dependencies on ids that are not in the task list are dropped with a
/// warning. A dependency cycle is unrecoverable and returns
/// [`Error::CircularDependency`] naming the tasks stuck in the cycle.
pub fn build_execution_plan(tasks: &[Task]) -> Result<ExecutionPlan> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let known: HashSet<u32> = tasks.iter().map(|t| t.id).collect();

    // indegree per task, adjacency from dependency to its dependents
    let mut indegree: HashMap<u32, usize> = HashMap::new();
    let mut dependents: HashMap<u32, Vec<u32>> = HashMap::new();
    for task in tasks {
        let mut degree = 0;
        for dep in &task.depends_on {
            if !known.contains(dep) {
                warn!(
                    task_id = task.id,
                    dependency = dep,
                    "Dropping dependency on unknown task"
                );
                continue;
            }
            degree += 1;
            dependents.entry(*dep).or_default().push(task.id);
        }
        indegree.insert(task.id, degree);
    }

    let by_id: HashMap<u32, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

    // Frontier kept in declared task order so plans are deterministic.
    let mut frontier: VecDeque<u32> = tasks
        .iter()
        .filter(|t| indegree[&t.id] == 0)
        .map(|t| t.id)
        .collect();

    let mut plan: ExecutionPlan = Vec::new();
    let mut scheduled: HashSet<u32> = HashSet::new();

    while !frontier.is_empty() {
        let level_ids: Vec<u32> = frontier.drain(..).collect();
        let mut released: Vec<u32> = Vec::new();
        for id in &level_ids {
            scheduled.insert(*id);
            if let Some(children) = dependents.get(id) {
                for child in children {
                    let degree = indegree
                        .get_mut(child)
                        .ok_or_else(|| Error::ProcessingFailed("task graph corrupted".into()))?;
                    *degree -= 1;
                    if *degree == 0 {
                        released.push(*child);
                    }
                }
            }
        }
        // Preserve declared order within the next level.
        frontier.extend(tasks.iter().map(|t| t.id).filter(|id| released.contains(id)));
        plan.push(level_ids.iter().map(|id| (*by_id[id]).clone()).collect());
    }

    if scheduled.len() < tasks.len() {
        let mut cycle: Vec<u32> = tasks
            .iter()
            .map(|t| t.id)
            .filter(|id| !scheduled.contains(id))
            .collect();
        cycle.sort_unstable();
        return Err(Error::CircularDependency { ids: cycle });
    }

    debug!(levels = plan.len(), tasks = tasks.len(), "Execution plan built");
    Ok(plan)
}

/// Execute a plan level by level.
///
/// Levels run in order. Within a level, tasks run concurrently when
/// `parallel` is set, otherwise one after another; either way the outputs
/// are flushed in the level's declared task order. A failing task
/// contributes a single error output instead of aborting the run.
pub async fn execute_plan(
    plan: &[Vec<Task>],
    runner: &dyn TaskRunner,
    max_steps: usize,
    parallel: bool,
) -> ExecutionReport {
    let mut report = ExecutionReport::empty();

    for (index, level) in plan.iter().enumerate() {
        if report.steps >= max_steps {
            warn!(
                level = index,
                steps = report.steps,
                max_steps, "Step budget exhausted, stopping execution"
            );
            report.budget_exhausted = true;
            break;
        }
        let remaining = max_steps - report.steps;

        let results: Vec<Vec<String>> = if parallel && level.len() > 1 {
            join_all(level.iter().map(|task| run_one(runner, task, remaining))).await
        } else {
            let mut sequential = Vec::with_capacity(level.len());
            for task in level {
                sequential.push(run_one(runner, task, remaining).await);
            }
            sequential
        };

        for outputs in results {
            report.steps += outputs.len();
            report.outputs.extend(outputs);
        }
        report.levels_completed += 1;
        debug!(
            level = index,
            steps = report.steps,
            "Execution level completed"
        );
    }

    report
}

async fn run_one(runner: &dyn TaskRunner, task: &Task, budget_remaining: usize) -> Vec<String> {
    match runner.run_task(task, budget_remaining).await {
        Ok(outputs) => outputs,
        Err(e) => {
            warn!(task_id = task.id, error = %e, "Task failed, continuing with remaining tasks");
            vec![format!("Görev {} başarısız: {}", task.id, e)]
        }
    }
}
