//! # AppError
//!
//! Centralized error handling for the Vistagram feed core.
//! Adapters raise `StorageError` / `UploadError`, the aggregate raises
//! `ValidationError`, and services surface all of them through `AppError`.

use thiserror::Error;
use uuid::Uuid;

/// A post field failed its shape rules. Messages are surfaced to clients verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must be between 2 and 30 characters")]
    UsernameLength,

    #[error("Username can only contain letters, numbers, and underscores")]
    UsernameCharset,

    #[error("Caption must be between 1 and 500 characters")]
    CaptionLength,

    #[error("Please provide a valid image URL")]
    ImageUrl,
}

/// Failure while handing an image to the blob store.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Only image files are allowed")]
    NotAnImage,

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image exceeds the {limit} byte upload limit ({actual} bytes)")]
    TooLarge { limit: usize, actual: usize },

    #[error("image could not be processed: {0}")]
    Processing(String),

    /// Disk or object-store failure.
    #[error("blob backend failure: {0}")]
    Backend(String),
}

/// Failure inside a post repository.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A persisted row could not be mapped back to a `Post`.
    #[error("corrupt post record {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

/// The primary error type for all feed operations.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced post does not exist at the time of access.
    #[error("Post not found with ID {0}")]
    NotFound(Uuid),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppError {
    /// True for kinds the caller can correct (bad input, missing post,
    /// rejected image); false for server-side failures.
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::Validation(_) | AppError::NotFound(_) => true,
            AppError::Upload(UploadError::Backend(_)) => false,
            AppError::Upload(_) => true,
            AppError::Storage(_) => false,
        }
    }

    /// The text shown to whoever made the request. Field and upload messages
    /// go out without the `Display` prefix.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Upload(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// A specialized Result type for feed logic.
pub type Result<T> = std::result::Result<T, AppError>;
