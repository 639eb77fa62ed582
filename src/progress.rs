//! Progress-callback trait for conversion-job events.
//!
//! Inject an [`Arc<dyn ShareProgressCallback>`] via
//! [`crate::config::ShareConfigBuilder::progress_callback`] to observe a
//! conversion as the coordinator submits and polls it.
//!
//! # Example
//!
//! ```rust
//! use share_convert::{JobState, ShareConfig, ShareProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter {
//!     polls: AtomicU32,
//! }
//!
//! impl ShareProgressCallback for PollCounter {
//!     fn on_poll(&self, _job_id: &str, attempt: u32, _state: JobState) {
//!         self.polls.store(attempt, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(PollCounter { polls: AtomicU32::new(0) });
//!
//! let config = ShareConfig::builder()
//!     .progress_callback(counter as Arc<dyn ShareProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::ConversionFailureKind;
use crate::model::JobState;
use std::sync::Arc;

/// How a conversion ended, as reported to [`ShareProgressCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    Completed,
    Failed(ConversionFailureKind),
}

/// Called by the coordinator while it drives a conversion job.
///
/// Implementations must be `Send + Sync`: concurrent share requests may share
/// one callback. All methods default to no-ops.
pub trait ShareProgressCallback: Send + Sync {
    /// The Conversion API accepted the job.
    fn on_conversion_submitted(&self, job_id: &str) {
        let _ = job_id;
    }

    /// A status fetch returned the job in `state`.
    ///
    /// # Arguments
    /// * `attempt` — 1-indexed poll attempt
    fn on_poll(&self, job_id: &str, attempt: u32, state: JobState) {
        let _ = (job_id, attempt, state);
    }

    /// A status fetch failed and counts as an inconclusive attempt.
    fn on_poll_error(&self, job_id: &str, attempt: u32, error: &str) {
        let _ = (job_id, attempt, error);
    }

    /// The conversion finished, successfully or not.
    ///
    /// `job_id` is `None` when the job could not be created.
    fn on_conversion_finished(&self, job_id: Option<&str>, outcome: ConversionOutcome) {
        let _ = (job_id, outcome);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ShareProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ShareConfig`].
pub type ProgressCallback = Arc<dyn ShareProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ShareProgressCallback for Recorder {
        fn on_conversion_submitted(&self, job_id: &str) {
            self.events.lock().unwrap().push(format!("submitted {job_id}"));
        }

        fn on_poll(&self, job_id: &str, attempt: u32, state: JobState) {
            self.events
                .lock()
                .unwrap()
                .push(format!("poll {job_id} #{attempt} {state}"));
        }

        fn on_conversion_finished(&self, _job_id: Option<&str>, outcome: ConversionOutcome) {
            self.events.lock().unwrap().push(format!("finished {outcome:?}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_submitted("job");
        cb.on_poll("job", 1, JobState::Pending);
        cb.on_poll_error("job", 2, "connection reset");
        cb.on_conversion_finished(None, ConversionOutcome::Completed);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_conversion_submitted("j1");
        rec.on_poll("j1", 1, JobState::Pending);
        rec.on_poll("j1", 2, JobState::Completed);
        rec.on_poll_error("j1", 3, "ignored by default impl");
        rec.on_conversion_finished(Some("j1"), ConversionOutcome::Completed);

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "submitted j1",
                "poll j1 #1 PENDING",
                "poll j1 #2 COMPLETED",
                "finished Completed",
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_finished(
            Some("j2"),
            ConversionOutcome::Failed(ConversionFailureKind::ConversionTimedOut),
        );
    }
}
