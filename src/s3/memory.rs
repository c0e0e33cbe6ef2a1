//! In-memory [`ObjectStore`] for tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::store::{ObjectStore, Payload, UploadArtifact};
use crate::error::{GalleryError, Result};

/// What a put recorded about its artifact
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    /// Keys in the order their puts completed
    completed: Mutex<Vec<String>>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    fail_listing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, key: &str) -> Self {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body: Vec::new(),
                content_type: None,
            },
        );
        self
    }

    /// Hold the put for `key` for `delay` before it completes
    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Panic inside the put for `key`, as a crashed upload task would
    pub fn panicking_on(mut self, key: &str) -> Self {
        self.panicking.insert(key.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

impl ObjectStore for MemoryStore {
    async fn ensure_bucket(&self, _bucket: &str) -> Result<()> {
        Ok(())
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        if self.fail_listing {
            return Err(GalleryError::RemoteListFailed {
                bucket: bucket.to_string(),
                message: "access denied".to_string(),
            });
        }
        Ok(self.keys())
    }

    async fn put_object(&self, bucket: &str, artifact: &UploadArtifact) -> Result<()> {
        if let Some(delay) = self.delays.get(&artifact.key) {
            tokio::time::sleep(*delay).await;
        }

        if self.panicking.contains(&artifact.key) {
            panic!("injected panic for {}", artifact.key);
        }

        if self.failing.contains(&artifact.key) {
            self.completed.lock().unwrap().push(artifact.key.clone());
            return Err(GalleryError::RemoteWriteFailed {
                bucket: bucket.to_string(),
                key: artifact.key.clone(),
                message: "injected failure".to_string(),
            });
        }

        let body = match &artifact.payload {
            Payload::Bytes(bytes) => bytes.clone(),
            Payload::Temp(path) => {
                std::fs::read(path).map_err(|e| GalleryError::RemoteWriteFailed {
                    bucket: bucket.to_string(),
                    key: artifact.key.clone(),
                    message: e.to_string(),
                })?
            }
        };

        self.objects.lock().unwrap().insert(
            artifact.key.clone(),
            StoredObject {
                body,
                content_type: artifact.content_type.clone(),
            },
        );
        self.completed.lock().unwrap().push(artifact.key.clone());
        Ok(())
    }
}
