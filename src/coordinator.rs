//! Drive one conversion job from submission to a terminal state.
//!
//! ## Polling Strategy
//!
//! The Conversion API is eventually consistent: `POST /conversions` returns a
//! `PENDING` job and the result only shows up on later `GET`s. The coordinator
//! polls under a [`PollPolicy`]: the first fetch happens right away, later
//! fetches back off exponentially up to a cap, and the whole phase is bounded
//! by both an attempt count and a wall-clock deadline. Failed fetches are
//! inconclusive attempts, not job failures. The delay is a `tokio` sleep, so
//! a waiting request never blocks other requests on the runtime.

use crate::client::ConversionApi;
use crate::config::{PollPolicy, MAX_POLL_TIMEOUT_SECS};
use crate::error::{ApiError, ConversionFailure};
use crate::model::{
    replace_extension, ConversionJob, ConvertedFile, CreateConversionRequest, FileDescriptor,
    JobState, TargetFormat,
};
use crate::progress::{ConversionOutcome, ProgressCallback};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

/// Submits conversion jobs and waits for them to finish.
#[derive(Clone)]
pub struct ConversionCoordinator {
    api: Arc<dyn ConversionApi>,
    policy: PollPolicy,
    progress: Option<ProgressCallback>,
}

impl ConversionCoordinator {
    pub fn new(api: Arc<dyn ConversionApi>, policy: PollPolicy) -> Self {
        Self {
            api,
            policy,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Convert `input` to `target_format`.
    ///
    /// # Errors
    /// * [`ConversionFailure::SubmissionFailed`] — job creation failed; no
    ///   fetch is made.
    /// * [`ConversionFailure::Errored`] — the job ended in `ERROR`, or a fetch
    ///   returned an unreadable job.
    /// * [`ConversionFailure::TimedOut`] — no terminal state within the budget.
    pub async fn convert(
        &self,
        input: &FileDescriptor,
        target_format: &str,
    ) -> Result<ConvertedFile, ConversionFailure> {
        let request = CreateConversionRequest {
            input_file: input.clone(),
            output_file: TargetFormat {
                format: target_format.to_string(),
            },
        };

        let submitted = match self.api.create_conversion(&request).await {
            Ok(job) => job,
            Err(source) => {
                warn!(
                    "Conversion of '{}' to {} could not be submitted: {}",
                    input.name, target_format, source
                );
                let failure = ConversionFailure::SubmissionFailed { source };
                self.report_finished(None, Err(&failure));
                return Err(failure);
            }
        };

        info!(
            "Conversion job {} submitted ({} → {}), state {}",
            submitted.id, input.format, target_format, submitted.state
        );
        if let Some(ref cb) = self.progress {
            cb.on_conversion_submitted(&submitted.id);
        }

        let job_id = submitted.id.clone();
        let outcome = if submitted.state.is_terminal() {
            finish(input, submitted)
        } else {
            match self.poll_until_terminal(&job_id).await {
                Ok(job) => finish(input, job),
                Err(failure) => Err(failure),
            }
        };

        self.report_finished(Some(&job_id), outcome.as_ref());
        outcome
    }

    /// Fetch the job until it is terminal or the budget runs out.
    async fn poll_until_terminal(&self, job_id: &str) -> Result<ConversionJob, ConversionFailure> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.policy.timeout)
            .unwrap_or_else(|| started + Duration::from_secs(MAX_POLL_TIMEOUT_SECS));
        let mut attempts = 0u32;
        let mut last_error: Option<ApiError> = None;

        for attempt in 1..=self.policy.max_attempts {
            let delay = self.policy.delay_before(attempt);
            if !delay.is_zero() {
                match Instant::now().checked_add(delay) {
                    Some(wake) if wake < deadline => sleep(delay).await,
                    _ => {
                        debug!("Job {}: next poll would pass the deadline", job_id);
                        break;
                    }
                }
            }

            attempts = attempt;
            let fetched = match timeout_at(deadline, self.api.get_conversion(job_id)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!("Job {}: deadline reached during poll {}", job_id, attempt);
                    break;
                }
            };

            match fetched {
                Ok(job) => {
                    debug!("Job {}: poll {} → {}", job_id, attempt, job.state);
                    if let Some(ref cb) = self.progress {
                        cb.on_poll(job_id, attempt, job.state);
                    }
                    if job.state.is_terminal() {
                        return Ok(job);
                    }
                    last_error = None;
                }
                Err(ApiError::MalformedJob { reason }) => {
                    warn!("Job {}: unreadable status payload: {}", job_id, reason);
                    return Err(ConversionFailure::Errored {
                        job_id: job_id.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        "Job {}: poll {}/{} inconclusive: {}",
                        job_id, attempt, self.policy.max_attempts, e
                    );
                    if let Some(ref cb) = self.progress {
                        cb.on_poll_error(job_id, attempt, &e.to_string());
                    }
                    last_error = Some(e);
                }
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        warn!(
            "Job {}: no terminal state after {} polls in {}ms",
            job_id, attempts, elapsed_ms
        );
        Err(ConversionFailure::TimedOut {
            job_id: job_id.to_string(),
            attempts,
            elapsed_ms,
            last_error,
        })
    }

    fn report_finished(
        &self,
        job_id: Option<&str>,
        outcome: Result<&ConvertedFile, &ConversionFailure>,
    ) {
        if let Some(ref cb) = self.progress {
            let outcome = match outcome {
                Ok(_) => ConversionOutcome::Completed,
                Err(failure) => ConversionOutcome::Failed(failure.kind()),
            };
            cb.on_conversion_finished(job_id, outcome);
        }
    }
}

/// Map a terminal job to the conversion result.
fn finish(input: &FileDescriptor, job: ConversionJob) -> Result<ConvertedFile, ConversionFailure> {
    job.check_consistency();
    match job.state {
        JobState::Completed => {
            let name = job
                .output_file
                .name
                .unwrap_or_else(|| replace_extension(&input.name, &job.output_file.format));
            info!("Conversion job {} completed: {}", job.id, name);
            Ok(ConvertedFile {
                name,
                format: job.output_file.format,
            })
        }
        JobState::Error => {
            warn!("Conversion job {} ended in ERROR", job.id);
            Err(ConversionFailure::Errored { job_id: job.id })
        }
        // Callers only pass terminal jobs.
        JobState::Pending => Err(ConversionFailure::TimedOut {
            job_id: job.id,
            attempts: 0,
            elapsed_ms: 0,
            last_error: None,
        }),
    }
}
