//! Batch import pipeline.
//!
//! Pulls a token-addressed batch of glucose readings from the remote service
//! and commits it to the local health store in one write.

pub mod fetcher;
pub mod manual;
pub mod orchestrator;
pub mod payload;
pub mod permission;
pub mod store;
pub mod types;


pub use fetcher::{BatchFetcher, RemoteBatchFetcher};
pub use manual::ManualEntry;
pub use orchestrator::SyncOrchestrator;
pub use payload::{parse, ParsedBatch, RawBatchItem, SkipReason};
pub use permission::{PermissionCapability, PermissionGate};
pub use store::{
    install_shared_store, shared_store, GlucoseRecord, HealthStore, HealthStoreWriter,
    InMemoryHealthStore, MealType, RelationToMeal, SpecimenSource,
};
pub use types::{ConvertedReading, ImportResult, PermissionState, SyncStage, ValidatedReading};
