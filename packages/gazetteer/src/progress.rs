//! Progress reporting for gazetteer builds.
//!
//! A build reads several dumps and then indexes every entity. The
//! [`BuildProgress`] trait lets a caller render that however it likes
//! (progress bars in the CLI, nothing in tests).

use std::sync::Arc;

/// Receives progress updates from a gazetteer build.
pub trait BuildProgress: Send + Sync {
    /// A new phase started (`"reading geonames"`, `"indexing names"`).
    /// `total` is the number of units in the phase, when known.
    fn phase(&self, name: &str, total: Option<u64>);

    /// Advance the current phase by `delta` units.
    fn inc(&self, delta: u64);

    /// The build finished.
    fn finish(&self, summary: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl BuildProgress for NullProgress {
    fn phase(&self, _name: &str, _total: Option<u64>) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _summary: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn BuildProgress> {
    Arc::new(NullProgress)
}
