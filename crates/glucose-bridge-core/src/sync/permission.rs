//! Write-authorization for blood glucose records.
//!
//! The host platform owns the actual permission dialog. It is reached through
//! [`PermissionCapability`], a yes/no query plus an interactive request, so the
//! pipeline only ever sees a [`PermissionState`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PermissionError;
use crate::sync::types::PermissionState;

/// Platform permission collaborator.
#[async_trait]
pub trait PermissionCapability: Send + Sync {
    /// Whether writing blood glucose is currently allowed.
    async fn query(&self) -> Result<bool, PermissionError>;

    /// Show the platform grant flow. May suspend until the user answers.
    async fn request(&self) -> Result<bool, PermissionError>;
}

/// Interprets the capability's answers as a [`PermissionState`].
#[derive(Clone)]
pub struct PermissionGate {
    capability: Arc<dyn PermissionCapability>,
}

impl PermissionGate {
    pub fn new(capability: Arc<dyn PermissionCapability>) -> Self {
        Self { capability }
    }

    /// Ask the platform for the current state. Never cached.
    ///
    /// A failing query yields `Unknown`, which the pipeline treats as denied.
    pub async fn current_state(&self) -> PermissionState {
        interpret(self.capability.query().await, "query")
    }

    /// Start the interactive grant flow.
    ///
    /// This is a user action; the sync pipeline never calls it.
    pub async fn request_grant(&self) -> PermissionState {
        interpret(self.capability.request().await, "request")
    }
}

fn interpret(answer: Result<bool, PermissionError>, operation: &'static str) -> PermissionState {
    match answer {
        Ok(true) => PermissionState::Granted,
        Ok(false) => PermissionState::Denied,
        Err(err) => {
            tracing::warn!(operation, error = %err, "Permission capability failed");
            PermissionState::Unknown
        }
    }
}
