//! Orchestrated multi-agent pipeline for Turkish financial market questions
//!
//! A query flows through routing, planning, dependency-aware scheduled
//! execution, validation and synthesis. The scheduler groups planned tasks
//! into levels of independent work and runs each level concurrently under
//! a global step budget.

pub mod agents;
pub mod chart;
pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod scheduler;
pub mod valuation;

pub use config::{ModelConfig, OrchestratorConfig, Timeouts};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use scheduler::{ExecutionPlan, ExecutionReport, TaskRunner};
pub use valuation::ValuationWorkflow;
