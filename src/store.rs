//! Share persistence.
//!
//! The pipeline only needs one operation: store a finished share and get back
//! its identifier. [`ShareStore`] implementations must assign collision-free
//! identifiers atomically; concurrent share requests call `create` without any
//! coordination of their own.

use crate::error::StoreError;
use crate::model::{NewShare, ShareResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Storage for share records.
#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Persist `share` under a fresh identifier and return the stored record.
    async fn create(&self, share: NewShare) -> Result<ShareResult, StoreError>;
}

/// In-process share store keyed by UUID v4.
#[derive(Debug, Default)]
pub struct MemoryShareStore {
    shares: RwLock<HashMap<String, ShareResult>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<ShareResult> {
        self.shares.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.shares.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shares.read().await.is_empty()
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn create(&self, share: NewShare) -> Result<ShareResult, StoreError> {
        let mut shares = self.shares.write().await;

        let mut id = Uuid::new_v4().to_string();
        while shares.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let record = ShareResult {
            id: id.clone(),
            name: share.name,
            mode: share.mode,
            original_file: share.original_file,
        };
        shares.insert(id, record.clone());
        debug!("Stored share {} ({})", record.id, record.name);
        Ok(record)
    }
}
