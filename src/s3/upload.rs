//! Upload orchestration.
//!
//! [`UploadOrchestrator::submit`] spawns one task per artifact and returns at
//! once; [`UploadOrchestrator::await_all`] drains every task before reporting.
//! The pending set is a [`JoinSet`], so dropping the orchestrator aborts
//! whatever is still in flight.

use indicatif::ProgressBar;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info};

use super::store::{ObjectStore, UploadArtifact};
use crate::error::{GalleryError, Result};

/// Lifecycle of a single upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Submitted,
    Completed,
    Failed(String),
}

/// Terminal record of one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub key: String,
    pub state: UploadState,
}

/// Submits uploads without blocking and waits for all of them together
pub struct UploadOrchestrator<S: ObjectStore> {
    store: Arc<S>,
    bucket: String,
    pending: JoinSet<Result<()>>,
    /// Destination key of every task still in `pending`
    keys: HashMap<Id, String>,
    submitted: Vec<UploadOutcome>,
}

impl<S: ObjectStore> UploadOrchestrator<S> {
    pub fn new(store: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            pending: JoinSet::new(),
            keys: HashMap::new(),
            submitted: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of uploads submitted and not yet awaited
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Every upload submitted since the last successful [`await_all`](Self::await_all),
    /// in submission order
    pub fn outcomes(&self) -> &[UploadOutcome] {
        &self.submitted
    }

    /// Start uploading `artifact` in the background
    ///
    /// Must be called from within a tokio runtime. The artifact, including
    /// any temp file backing it, is owned by the upload task until it ends.
    pub fn submit(&mut self, artifact: UploadArtifact) {
        let store = Arc::clone(&self.store);
        let bucket = self.bucket.clone();
        let key = artifact.key.clone();

        debug!("Submitting upload s3://{}/{}", bucket, key);
        self.submitted.push(UploadOutcome {
            key: key.clone(),
            state: UploadState::Submitted,
        });

        let handle = self.pending.spawn(async move {
            let result = store.put_object(&bucket, &artifact).await;
            drop(artifact);
            result
        });
        self.keys.insert(handle.id(), key);
    }

    /// Block until every submitted upload has finished, in any order
    ///
    /// Failures do not cut the wait short: every upload reaches a terminal
    /// state first, then the first failure observed is returned. On failure
    /// the per-key states stay available from [`outcomes`](Self::outcomes).
    /// With nothing pending this returns immediately.
    pub async fn await_all(&mut self, progress: Option<&ProgressBar>) -> Result<Vec<UploadOutcome>> {
        if let Some(pb) = progress {
            pb.set_length(self.pending.len() as u64);
            pb.set_position(0);
        }

        let mut first_error = None;
        while let Some(joined) = self.pending.join_next_with_id().await {
            let (key, result) = match joined {
                Ok((id, result)) => (self.take_key(id), result),
                // The task panicked or was cancelled
                Err(e) => {
                    let key = self.take_key(e.id());
                    let failure = GalleryError::RemoteWriteFailed {
                        bucket: self.bucket.clone(),
                        key: key.clone(),
                        message: format!("upload task failed: {}", e),
                    };
                    (key, Err(failure))
                }
            };

            let state = match result {
                Ok(()) => {
                    debug!("Upload finished: {}", key);
                    UploadState::Completed
                }
                Err(e) => {
                    error!("Upload failed: {}", e);
                    let message = e.to_string();
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    UploadState::Failed(message)
                }
            };
            self.record(&key, state);

            if let Some(pb) = progress {
                pb.inc(1);
                pb.set_message(key);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let outcomes = std::mem::take(&mut self.submitted);
        info!("All {} uploads completed", outcomes.len());
        Ok(outcomes)
    }

    fn take_key(&mut self, id: Id) -> String {
        self.keys.remove(&id).unwrap_or_default()
    }

    fn record(&mut self, key: &str, state: UploadState) {
        if let Some(outcome) = self
            .submitted
            .iter_mut()
            .find(|o| o.key == key && o.state == UploadState::Submitted)
        {
            outcome.state = state;
        }
    }
}
