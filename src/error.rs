use std::path::PathBuf;
use thiserror::Error;

/// Everything that can end a gallery run
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Bad or missing command-line input
    #[error("Invalid arguments: {0}")]
    Argument(String),

    /// Credential file missing, unreadable, or incomplete
    #[error("Credentials unavailable at {path}: {reason}")]
    CredentialsUnavailable { path: PathBuf, reason: String },

    #[error("Cannot read directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list objects in bucket '{bucket}': {message}")]
    RemoteListFailed { bucket: String, message: String },

    #[error("Failed to write s3://{bucket}/{key}: {message}")]
    RemoteWriteFailed {
        bucket: String,
        key: String,
        message: String,
    },

    /// The destination already holds content for this upload
    #[error("Remote object '{existing}' collides with '{candidate}'")]
    CollisionDetected { candidate: String, existing: String },

    #[error("Failed to write archive: {0}")]
    ArchiveWriteFailed(String),

    #[error("Failed to decode image {path}: {message}")]
    DecodeFailed { path: PathBuf, message: String },

    #[error("Unsupported dimension mode: {0}")]
    UnsupportedDimensionMode(String),

    #[error("Invalid album name '{0}'")]
    InvalidAlbumName(String),

    #[error("Invalid bucket name '{bucket}': {reason}")]
    InvalidBucketName { bucket: String, reason: String },
}

impl GalleryError {
    /// Wrap an SDK list error, keeping the whole error chain in the message
    pub fn list_failed<E>(bucket: &str, error: E) -> Self
    where
        E: std::error::Error,
    {
        Self::RemoteListFailed {
            bucket: bucket.to_string(),
            message: aws_sdk_s3::error::DisplayErrorContext(error).to_string(),
        }
    }

    pub fn write_failed<E>(bucket: &str, key: &str, error: E) -> Self
    where
        E: std::error::Error,
    {
        Self::RemoteWriteFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: aws_sdk_s3::error::DisplayErrorContext(error).to_string(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::Argument(message) => {
                format!("{}\n\nRun with --help to see the available options", message)
            }
            Self::CredentialsUnavailable { path, reason } => {
                format!(
                    "Credentials unavailable: {}\n\nPossible solutions:\n  \
                     1. Create {} with `accessKey=...` and `secretKey=...` lines\n  \
                     2. Point AWS_CREDENTIALS_FILE at an existing properties file",
                    reason,
                    path.display()
                )
            }
            Self::CollisionDetected {
                candidate,
                existing,
            } => {
                format!(
                    "'{}' already exists on S3 (matched '{}')\n\nPossible solutions:\n  \
                     1. Pick a different album name\n  \
                     2. Overwrite the existing content with --force-upload",
                    existing, candidate
                )
            }
            Self::RemoteListFailed { bucket, message } => {
                format!(
                    "Could not list bucket '{}': {}\n\nPossible solutions:\n  \
                     1. Check the access key in your credentials file\n  \
                     2. Check AWS_REGION matches the bucket region",
                    bucket, message
                )
            }
            Self::InvalidAlbumName(name) => {
                format!(
                    "Album name '{}' can only contain letters, numbers, hyphens, and underscores",
                    name
                )
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
