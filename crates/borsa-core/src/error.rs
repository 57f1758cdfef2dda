//! Error types for borsa-core

use thiserror::Error;

/// Result type alias for borsa-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for orchestration operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Orchestrator initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Query processing failed
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The task dependency graph contains a cycle
    ///
    /// Fatal for the whole query: planning aborts before any task runs.
    #[error("Circular dependency detected among tasks {ids:?}")]
    CircularDependency {
        /// Task ids left unresolved by the topological sort
        ids: Vec<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_names_tasks() {
        let err = Error::CircularDependency { ids: vec![1, 2] };
        let msg = err.to_string();
        assert!(msg.contains('1'));
        assert!(msg.contains('2'));
    }
}
