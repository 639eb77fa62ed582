//! # share-convert
//!
//! Share a file, converting it to another format first when asked, by
//! delegating the conversion to an external Conversion API over HTTP.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ShareRequest
//!  │
//!  ├─ 1. Decide    convertTo absent or same format? → store directly
//!  ├─ 2. Submit    POST /conversions                 (ConversionCoordinator)
//!  ├─ 3. Poll      GET /conversions/{id}, bounded backoff until COMPLETED | ERROR
//!  ├─ 4. Classify  ConversionErrored / SubmissionFailed / ConversionTimedOut
//!  └─ 5. Persist   ShareStore::create → ShareResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use share_convert::{MemoryShareStore, ShareConfig, ShareMode, ShareOrchestrator, ShareRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShareConfig::builder()
//!         .conversion_api_url("http://localhost:3001")
//!         .build()?;
//!     let orchestrator = ShareOrchestrator::from_config(&config, Arc::new(MemoryShareStore::new()))?;
//!
//!     let request = ShareRequest::new("example.docx", ShareMode::Public).convert_to("pdf");
//!     match orchestrator.create_share(&request).await {
//!         Ok(share) => println!("{}", serde_json::to_string(&share)?),
//!         Err(e) => eprintln!("{} {}", e.status_code(), e.response_body().message),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `share-convert` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod progress;
pub mod share;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{ConversionApi, HttpConversionClient};
pub use config::{PollPolicy, ShareConfig, ShareConfigBuilder};
pub use coordinator::ConversionCoordinator;
pub use error::{
    ApiError, ConversionFailure, ConversionFailureKind, ErrorBody, ShareError, StoreError,
};
pub use model::{
    ConversionJob, ConvertedFile, CreateConversionRequest, FileDescriptor, JobState, NewShare,
    OriginalFile, OutputFile, ShareMode, ShareRequest, ShareResult, TargetFormat,
};
pub use progress::{
    ConversionOutcome, NoopProgressCallback, ProgressCallback, ShareProgressCallback,
};
pub use share::ShareOrchestrator;
pub use store::{MemoryShareStore, ShareStore};
