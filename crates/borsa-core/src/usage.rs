//! Shared usage accounting
//!
//! One tracker is created per query and handed to every agent invocation so
//! cross-agent totals can be reported at the end. Parallel tasks within a
//! level accumulate into the same tracker, so the counters are atomic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals of model usage for one query
///
/// Cheap to clone; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    inner: Arc<UsageInner>,
}

#[derive(Debug, Default)]
struct UsageInner {
    requests: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Number of model calls made
    pub requests: u64,
    /// Total input tokens
    pub input_tokens: u64,
    /// Total output tokens
    pub output_tokens: u64,
}

impl UsageSnapshot {
    /// Total tokens used (input + output)
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl UsageTracker {
    /// Create a fresh tracker with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one model call's token usage
    pub fn record(&self, input_tokens: u64, output_tokens: u64) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        self.inner
            .input_tokens
            .fetch_add(input_tokens, Ordering::Relaxed);
        self.inner
            .output_tokens
            .fetch_add(output_tokens, Ordering::Relaxed);
    }

    /// Read the current totals
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            requests: self.inner.requests.load(Ordering::Relaxed),
            input_tokens: self.inner.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.inner.output_tokens.load(Ordering::Relaxed),
        }
    }
}
