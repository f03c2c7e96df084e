//! # Glucose Bridge Core Library
//!
//! Imports blood-glucose readings from a remote batch service into the
//! user's local health store.
//!
//! ## Architecture
//!
//! - **Units**: mmol/L ↔ mg/dL conversion
//! - **Sync**: permission check, HTTP fetch, payload validation, conversion
//!   and the bulk store write, sequenced by [`SyncOrchestrator`]
//! - **Token**: import tokens and their extraction from launch links
//!
//! The platform permission dialog and the health store itself are external
//! collaborators, reached through [`PermissionCapability`] and [`HealthStore`].
//!
//! ## Key Components
//!
//! - [`SyncOrchestrator`]: runs one import and returns an [`ImportResult`]
//! - [`RemoteBatchFetcher`]: single-attempt HTTP GET of a batch
//! - [`BridgeConfig`]: endpoint and HTTP settings

pub mod config;
pub mod error;
pub mod logging;
pub mod sync;
pub mod token;
pub mod units;

pub use config::{BridgeConfig, DEFAULT_BASE_URL};
pub use error::{ErrorKind, FetchError, PayloadError, PermissionError, StoreError, SyncError};
pub use sync::{
    ConvertedReading, GlucoseRecord, HealthStore, HealthStoreWriter, ImportResult,
    InMemoryHealthStore, ManualEntry, PermissionCapability, PermissionGate, PermissionState,
    RemoteBatchFetcher, SyncOrchestrator, ValidatedReading,
};
pub use token::ImportToken;
pub use units::{to_milligrams_per_deciliter, GlucoseUnit};
