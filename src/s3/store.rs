use std::future::Future;
use std::path::Path;
use tempfile::TempPath;

use super::helpers::detect_content_type;
use crate::error::Result;

/// Storage tier for an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Standard,
    /// Cheaper, less durable; fine for derivatives that can be regenerated
    ReducedRedundancy,
}

/// Who may read an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    Private,
    PublicRead,
}

/// Where the bytes of an artifact come from
#[derive(Debug)]
pub enum Payload {
    /// A temporary file, deleted once the upload that owns it is dropped
    Temp(TempPath),
    Bytes(Vec<u8>),
}

/// One object to place in the bucket
#[derive(Debug)]
pub struct UploadArtifact {
    pub key: String,
    pub payload: Payload,
    pub content_type: Option<String>,
    pub storage_class: StorageTier,
    pub access: AccessPolicy,
}

impl UploadArtifact {
    /// A publicly readable, reduced-redundancy artifact typed by its key's extension
    pub fn new(key: impl Into<String>, payload: Payload) -> Self {
        let key = key.into();
        let content_type = detect_content_type(Path::new(&key));
        Self {
            key,
            payload,
            content_type,
            storage_class: StorageTier::ReducedRedundancy,
            access: AccessPolicy::PublicRead,
        }
    }

    pub fn with_storage(mut self, storage_class: StorageTier) -> Self {
        self.storage_class = storage_class;
        self
    }

    pub fn with_access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }
}

/// The object-storage operations a gallery run needs
///
/// [`S3Client`](super::S3Client) talks to S3; tests use an in-memory store.
pub trait ObjectStore: Send + Sync + 'static {
    /// Create the bucket, succeeding if it already exists
    fn ensure_bucket(&self, bucket: &str) -> impl Future<Output = Result<()>> + Send;

    /// Every key currently in the bucket
    fn list_keys(&self, bucket: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn put_object(
        &self,
        bucket: &str,
        artifact: &UploadArtifact,
    ) -> impl Future<Output = Result<()>> + Send;
}
