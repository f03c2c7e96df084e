//! Shared doubles for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use glucose_bridge_core::{
    BridgeConfig, InMemoryHealthStore, PermissionCapability, PermissionError, SyncOrchestrator,
};

pub const MIXED_BATCH: &str = r#"{"items":[{"datetime_iso":"2024-01-01T10:00:00Z","value_mmol":6.1},{"datetime_iso":"bad","value_mmol":5.0},{"datetime_iso":"2024-01-01T11:00:00+02:00","value_mmol":-1}]}"#;

/// Permission capability with a fixed answer.
pub struct FixedPermission {
    granted: bool,
    pub queries: AtomicUsize,
}

impl FixedPermission {
    pub fn granted() -> Arc<Self> {
        Arc::new(Self {
            granted: true,
            queries: AtomicUsize::new(0),
        })
    }

    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            granted: false,
            queries: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PermissionCapability for FixedPermission {
    async fn query(&self) -> Result<bool, PermissionError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.granted)
    }

    async fn request(&self) -> Result<bool, PermissionError> {
        Ok(self.granted)
    }
}

/// Orchestrator pointed at `base_url`, backed by a fresh in-memory store.
pub fn orchestrator(
    base_url: &str,
    permission: Arc<FixedPermission>,
) -> (SyncOrchestrator, Arc<InMemoryHealthStore>) {
    let store = Arc::new(InMemoryHealthStore::new());
    let orchestrator = SyncOrchestrator::from_config(
        &BridgeConfig::with_base_url(base_url),
        permission,
        store.clone(),
    )
    .expect("http client");
    (orchestrator, store)
}
