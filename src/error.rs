//! Error types for the share-convert library.
//!
//! Errors are layered the same way the share pipeline is:
//!
//! * [`ApiError`] — a single call to the Conversion API went wrong
//!   (transport failure, non-2xx status, undecodable job payload).
//! * [`ConversionFailure`] — the outcome of driving one conversion job,
//!   produced by [`crate::coordinator::ConversionCoordinator`]. It keeps
//!   "the job itself failed" apart from "we never saw it finish".
//! * [`ShareError`] — **Fatal** for a share request. Returned as
//!   `Err(ShareError)` from [`crate::share::ShareOrchestrator::create_share`]
//!   and mapped to a user-visible status and body by
//!   [`ShareError::status_code`] / [`ShareError::response_body`].
//!
//! Only [`ShareError`] crosses the library boundary as a failure; the inner
//! types are carried inside it so callers can still log the exact cause.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-visible message for a job that reached the `ERROR` state.
pub const CONVERSION_ERROR_MESSAGE: &str = "Error converting file";

/// User-visible message when no structured upstream message is available.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

// ── Conversion API errors ─────────────────────────────────────────────────

/// A failed call to the external Conversion API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Conversion API request failed: {reason}")]
    Transport { reason: String },

    /// The API answered with a non-2xx status.
    ///
    /// `message` is the `{ "message": ... }` field of the response body when
    /// the API sent one.
    #[error("Conversion API returned HTTP {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Status { status: u16, message: Option<String> },

    /// The API answered 2xx but the body is not a valid conversion job.
    #[error("Conversion API returned a malformed job: {reason}")]
    MalformedJob { reason: String },
}

impl ApiError {
    /// The upstream `{ message }` carried by a non-2xx response, if any.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the upstream response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion outcome ────────────────────────────────────────────────────

/// Classification of a failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionFailureKind {
    /// The job could not be created.
    SubmissionFailed,
    /// The job reached the terminal `ERROR` state.
    ConversionErrored,
    /// The job did not reach a terminal state within the polling budget.
    ConversionTimedOut,
}

/// Why a conversion did not produce a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionFailure {
    /// Job creation failed; nothing was polled.
    #[error("Failed to submit conversion job: {source}")]
    SubmissionFailed {
        #[source]
        source: ApiError,
    },

    /// The job finished in `ERROR`, or a poll returned an unreadable job.
    #[error("Conversion job {job_id} ended in error")]
    Errored { job_id: String },

    /// The polling budget ran out before a terminal state was observed.
    #[error("Conversion job {job_id} still not finished after {attempts} polls ({elapsed_ms}ms)")]
    TimedOut {
        job_id: String,
        attempts: u32,
        elapsed_ms: u64,
        /// The last inconclusive poll error, if the final attempts failed.
        last_error: Option<ApiError>,
    },
}

impl ConversionFailure {
    pub fn kind(&self) -> ConversionFailureKind {
        match self {
            ConversionFailure::SubmissionFailed { .. } => ConversionFailureKind::SubmissionFailed,
            ConversionFailure::Errored { .. } => ConversionFailureKind::ConversionErrored,
            ConversionFailure::TimedOut { .. } => ConversionFailureKind::ConversionTimedOut,
        }
    }

    /// Upstream message to surface to the user, when the API gave one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            ConversionFailure::SubmissionFailed { source } => source.upstream_message(),
            ConversionFailure::TimedOut { last_error, .. } => {
                last_error.as_ref().and_then(ApiError::upstream_message)
            }
            ConversionFailure::Errored { .. } => None,
        }
    }
}

// ── Persistence errors ────────────────────────────────────────────────────

/// Opaque failure from a [`crate::store::ShareStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Share store error: {0}")]
pub struct StoreError(pub String);

// ── Fatal share errors ────────────────────────────────────────────────────

/// All fatal errors returned by the share-convert library.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The share request itself is unusable (e.g. file name has no extension).
    #[error("Invalid share request: {0}")]
    InvalidRequest(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Conversion was required and did not succeed.
    #[error(transparent)]
    Conversion(#[from] ConversionFailure),

    /// The share record could not be stored.
    #[error("Failed to persist share: {0}")]
    PersistenceFailed(#[from] StoreError),
}

/// JSON body returned to the caller of "create share" on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ShareError {
    /// HTTP-equivalent status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            ShareError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// The user-visible body for this failure.
    ///
    /// `ConversionErrored` always reads "Error converting file". Submission
    /// failures and timeouts pass the upstream message through unchanged, or
    /// fall back to "Internal server error".
    pub fn response_body(&self) -> ErrorBody {
        let message = match self {
            ShareError::InvalidRequest(msg) => msg.clone(),
            ShareError::Conversion(failure) => match failure.kind() {
                ConversionFailureKind::ConversionErrored => CONVERSION_ERROR_MESSAGE.to_string(),
                _ => failure
                    .upstream_message()
                    .unwrap_or(INTERNAL_ERROR_MESSAGE)
                    .to_string(),
            },
            ShareError::InvalidConfig(_) | ShareError::PersistenceFailed(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        ErrorBody { message }
    }

    /// The conversion failure kind, when this error came from a conversion.
    pub fn conversion_kind(&self) -> Option<ConversionFailureKind> {
        match self {
            ShareError::Conversion(failure) => Some(failure.kind()),
            _ => None,
        }
    }
}
