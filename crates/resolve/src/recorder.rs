//! Metrics seam for the lookup engine.
//!
//! The engine reports what happened through a [`Recorder`]; exporting those
//! numbers anywhere is the embedding process's business.

use crate::report::{Outcome, Summary};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub trait Recorder: Send + Sync {
    /// Called once per classified identifier of a completed batch, before
    /// [`batch`](Self::batch). Aborted batches report no outcomes.
    fn outcome(&self, ecosystem: Option<&str>, outcome: Outcome);
    /// Called once per completed batch.
    fn batch(&self, summary: &Summary, elapsed: Duration);
    /// Called when a batch is aborted by a storage failure or cancellation.
    fn aborted(&self, reason: &crate::ErrorKind);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn outcome(&self, _: Option<&str>, _: Outcome) {}
    fn batch(&self, _: &Summary, _: Duration) {}
    fn aborted(&self, _: &crate::ErrorKind) {}
}

/// In-memory counters, mostly useful in tests.
#[derive(Debug, Default)]
pub struct CountingRecorder {
    outcomes: Mutex<BTreeMap<(String, Outcome), u64>>,
    batches: AtomicU64,
    aborted: AtomicU64,
}

impl CountingRecorder {
    /// Number of identifiers of `ecosystem` classified as `outcome`. Parse
    /// failures have no ecosystem and are counted under `""`.
    pub fn count(&self, ecosystem: &str, outcome: Outcome) -> u64 {
        self.outcomes
            .lock()
            .map(|counts| counts.get(&(ecosystem.to_string(), outcome)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn aborted_batches(&self) -> u64 {
        self.aborted.load(Ordering::Relaxed)
    }
}

impl Recorder for CountingRecorder {
    fn outcome(&self, ecosystem: Option<&str>, outcome: Outcome) {
        if let Ok(mut counts) = self.outcomes.lock() {
            *counts.entry((ecosystem.unwrap_or_default().to_string(), outcome)).or_default() += 1;
        }
    }

    fn batch(&self, _: &Summary, _: Duration) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    fn aborted(&self, _: &crate::ErrorKind) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }
}
