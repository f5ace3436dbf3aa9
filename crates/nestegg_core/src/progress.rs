//! Progress reporting and cooperative cancellation for long simulations
//!
//! A `SimulationProgress` is a cheap cloneable handle: clones share the same
//! counters, so a caller can keep one copy to poll or cancel while the
//! simulator holds another.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Shared progress tracker for Monte Carlo runs
#[derive(Debug, Clone)]
pub struct SimulationProgress {
    /// Completed paths counter
    completed: Arc<AtomicUsize>,
    /// Total paths
    total: Arc<AtomicUsize>,
    /// Cancellation flag
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
    /// Stop once this many paths have completed
    path_budget: Option<usize>,
}

impl SimulationProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
            path_budget: None,
        }
    }

    /// Create from existing atomics (for embedding in a host application)
    pub fn from_atomics(
        completed: Arc<AtomicUsize>,
        total: Arc<AtomicUsize>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            completed,
            total,
            cancelled,
            deadline: None,
            path_budget: None,
        }
    }

    /// Same handle that also reports cancellation once `timeout` has elapsed
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Same handle that also reports cancellation once `paths` paths have completed
    #[must_use]
    pub fn with_path_budget(mut self, paths: usize) -> Self {
        self.path_budget = Some(paths);
        self
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in `[0, 1]`; 0 before any work is registered
    #[must_use]
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.completed() as f64 / total as f64).min(1.0)
    }

    /// Add `paths` to the expected total
    pub fn add_total(&self, paths: usize) {
        self.total.fetch_add(paths, Ordering::Relaxed);
    }

    pub fn advance(&self, paths: usize) {
        self.completed.fetch_add(paths, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        self.cancelled.store(false, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// True once cancelled, past the deadline or over the path budget
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
            || self.path_budget.is_some_and(|budget| self.completed() >= budget)
    }
}

impl Default for SimulationProgress {
    fn default() -> Self {
        Self::new()
    }
}
