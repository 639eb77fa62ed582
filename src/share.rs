//! Share creation entry point.
//!
//! [`ShareOrchestrator::create_share`] decides whether a request needs a
//! conversion. The decision is made before the Conversion API is touched, so
//! a direct share never costs an external call.
//!
//! ```text
//! Received ─┬─ no conversion ─────────────────────────────▶ Persisted
//!           └─ Submitted ─▶ Polling* ─┬─ Completed ─────────▶ Persisted
//!                                     └─ Errored | TimedOut
//!                                        | SubmissionFailed ─▶ Failed
//! ```

use crate::client::{ConversionApi, HttpConversionClient};
use crate::config::ShareConfig;
use crate::coordinator::ConversionCoordinator;
use crate::error::ShareError;
use crate::model::{same_format, FileDescriptor, NewShare, OriginalFile, ShareRequest, ShareResult};
use crate::store::ShareStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns share requests into stored shares.
///
/// Holds no per-request state: one orchestrator can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct ShareOrchestrator {
    coordinator: ConversionCoordinator,
    store: Arc<dyn ShareStore>,
}

impl ShareOrchestrator {
    pub fn new(coordinator: ConversionCoordinator, store: Arc<dyn ShareStore>) -> Self {
        Self { coordinator, store }
    }

    /// Wire an orchestrator from config with a caller-supplied API client.
    pub fn with_api(
        config: &ShareConfig,
        api: Arc<dyn ConversionApi>,
        store: Arc<dyn ShareStore>,
    ) -> Self {
        let coordinator = ConversionCoordinator::new(api, config.poll_policy())
            .with_progress(config.progress_callback.clone());
        Self::new(coordinator, store)
    }

    /// Wire an orchestrator that talks HTTP to `config.conversion_api_url`.
    pub fn from_config(config: &ShareConfig, store: Arc<dyn ShareStore>) -> Result<Self, ShareError> {
        let api = HttpConversionClient::from_config(config)?;
        Ok(Self::with_api(config, Arc::new(api), store))
    }

    /// Create a share, converting the file first when `convert_to` asks for a
    /// different format.
    ///
    /// # Errors
    /// * [`ShareError::InvalidRequest`] — the file name has no extension.
    /// * [`ShareError::Conversion`] — the conversion failed; nothing is stored.
    /// * [`ShareError::PersistenceFailed`] — the store rejected the record.
    pub async fn create_share(&self, request: &ShareRequest) -> Result<ShareResult, ShareError> {
        let start = Instant::now();
        let input_format = request.input_format().ok_or_else(|| {
            ShareError::InvalidRequest(format!(
                "file name '{}' has no extension",
                request.name
            ))
        })?;

        let target = match request.target_format() {
            Some(target) if !same_format(target, input_format) => target,
            _ => {
                debug!("Share '{}': no conversion needed", request.name);
                let share = self
                    .store
                    .create(NewShare {
                        name: request.name.clone(),
                        mode: request.mode,
                        original_file: None,
                    })
                    .await?;
                info!("Shared '{}' as {} ({})", share.name, share.id, share.mode);
                return Ok(share);
            }
        };

        info!(
            "Share '{}': converting {} → {}",
            request.name, input_format, target
        );
        let input = FileDescriptor {
            name: request.name.clone(),
            format: input_format.to_string(),
        };

        let converted = match self.coordinator.convert(&input, target).await {
            Ok(converted) => converted,
            Err(failure) => {
                warn!(
                    "Share '{}' failed after {}ms: {}",
                    request.name,
                    start.elapsed().as_millis(),
                    failure
                );
                return Err(failure.into());
            }
        };

        let share = self
            .store
            .create(NewShare {
                name: converted.name,
                mode: request.mode,
                original_file: Some(OriginalFile {
                    name: request.name.clone(),
                }),
            })
            .await?;

        info!(
            "Shared '{}' as {} ({}) in {}ms",
            share.name,
            share.id,
            share.mode,
            start.elapsed().as_millis()
        );
        Ok(share)
    }
}
