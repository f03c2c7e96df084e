//! Runtime configuration for the import pipeline.
//!
//! There is no configuration file: the batch endpoint is compiled in as
//! [`DEFAULT_BASE_URL`]. Hosts that embed the library (and tests pointing at
//! a mock server) override fields programmatically or deserialize a
//! `BridgeConfig` from their own settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Compiled-in endpoint of the batch service.
pub const DEFAULT_BASE_URL: &str = "https://glucose-bridge.app/api";

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base endpoint; `/batch.php` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout for the batch GET.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("glucose-bridge/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl BridgeConfig {
    /// Same defaults, different endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
