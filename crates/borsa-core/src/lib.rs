//! Shared data model for borsa-rs
//!
//! This crate defines the task, verdict, and decision types exchanged between
//! the orchestrator's agents, plus the shared error taxonomy and the usage
//! tracker every agent invocation accumulates into.

pub mod error;
pub mod schemas;
pub mod usage;
pub mod valuation;

pub use error::{Error, Result};
pub use schemas::{Answer, IsDone, RouteDecision, Task, TaskList};
pub use usage::{UsageSnapshot, UsageTracker};
pub use valuation::{Decision, ValuationScores};
