pub mod client;
pub mod existence;
pub mod helpers;
#[cfg(test)]
pub mod memory;
pub mod store;
pub mod upload;

pub use client::S3Client;
pub use existence::{ensure_no_collision, CollisionTarget};
pub use store::{AccessPolicy, ObjectStore, Payload, StorageTier, UploadArtifact};
pub use upload::{UploadOrchestrator, UploadOutcome, UploadState};
