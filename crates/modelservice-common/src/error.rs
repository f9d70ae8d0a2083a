//! Error types for modelservice composition
//!
//! Errors are structured with fields so the reconciler can report them on
//! the owning resource's status. Every variant describes a deterministic
//! failure of a pure computation: retrying with the same inputs reproduces it.

use thiserror::Error;

/// Main error type for artifact resolution and configuration merges
#[derive(Debug, Error)]
pub enum Error {
    /// The artifact URI matches no known scheme or is malformed for its scheme
    #[error("invalid model artifact locator '{uri}': {message}")]
    InvalidLocator {
        /// The offending URI
        uri: String,
        /// Description of what's wrong with it
        message: String,
    },

    /// The artifact URI is well-formed but its source kind cannot be mounted
    #[error("unsupported model artifact source {kind} for '{uri}'")]
    UnsupportedSource {
        /// Source kind name (e.g., "ImageVolume")
        kind: String,
        /// The URI that was being resolved
        uri: String,
    },

    /// An element-level merge failed for a keyed list element
    #[error("merge conflict for '{key}': {source}")]
    MergeConflict {
        /// Merge key of the element being merged (e.g., the container name)
        key: String,
        /// The element-level failure
        source: Box<Error>,
    },

    /// A keyed list contains the same merge key more than once
    #[error("duplicate merge key '{key}'")]
    DuplicateMergeKey {
        /// The repeated key
        key: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The type being converted (if known)
        kind: Option<String>,
    },
}

impl Error {
    /// Create an invalid locator error
    pub fn invalid_locator(uri: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidLocator {
            uri: uri.into(),
            message: msg.into(),
        }
    }

    /// Create an unsupported source error
    pub fn unsupported_source(kind: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::UnsupportedSource {
            kind: kind.into(),
            uri: uri.into(),
        }
    }

    /// Wrap an element-level failure with the merge key it occurred under
    pub fn merge_conflict(key: impl Into<String>, source: Error) -> Self {
        Self::MergeConflict {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Create a duplicate merge key error
    pub fn duplicate_merge_key(key: impl Into<String>) -> Self {
        Self::DuplicateMergeKey { key: key.into() }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with type context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Check if this error is retryable
    ///
    /// Always false: resolution and merging are deterministic, so the
    /// reconciler should record the error on status instead of requeueing fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::InvalidLocator { .. }
            | Error::UnsupportedSource { .. }
            | Error::MergeConflict { .. }
            | Error::DuplicateMergeKey { .. }
            | Error::Serialization { .. } => false,
        }
    }

    /// Get the merge key if this error is associated with a keyed element
    pub fn merge_key(&self) -> Option<&str> {
        match self {
            Error::MergeConflict { key, .. } => Some(key),
            Error::DuplicateMergeKey { key } => Some(key),
            _ => None,
        }
    }

    /// Get the artifact URI if this error came from artifact resolution
    pub fn uri(&self) -> Option<&str> {
        match self {
            Error::InvalidLocator { uri, .. } => Some(uri),
            Error::UnsupportedSource { uri, .. } => Some(uri),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::serialization(e.to_string())
    }
}
