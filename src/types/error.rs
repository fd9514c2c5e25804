//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Classifies document-store failures so the pipeline can decide whether to
//! retry a container, skip it, or abort the run.
//!
//! ## Error Categories
//!
//! - **Transient**: Temporary store issues (retry the call)
//! - **RateLimit**: Request throttling (wait and retry)
//! - **Auth**: Credential failures (fail fast)
//! - **NotFound**: Missing database/container (skip)
//! - **Network**: Connectivity issues (retry with backoff)
//!
//! ## Design Principles
//!
//! - Single unified error type (MapError) for the entire application
//! - Collaborator failures are caught at the store boundary and converted to
//!   typed variants; nothing escapes into the inference core
//! - No panic/unwrap outside tests

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Failure categories for document-store calls, used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCategory {
    /// Request throttled (429) - wait then retry
    RateLimit,
    /// Authentication/authorization failed - fail fast
    Auth,
    /// Database, container, or document not found - skip
    NotFound,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Temporary server issues (5xx) - retry
    Transient,
    /// Malformed request or response - don't retry
    BadRequest,
    /// Unknown error - conservative single retry
    Unknown,
}

impl std::fmt::Display for StoreErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Network => write!(f, "NETWORK"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl StoreErrorCategory {
    /// Check if a call in this category is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Transient | Self::Unknown
        )
    }

    /// Recommended delay before retrying
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(5),
            Self::Network => Duration::from_secs(2),
            Self::Transient => Duration::from_secs(1),
            _ => Duration::from_millis(500),
        }
    }

    /// Classify an HTTP status code from the store REST API
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit,
            401 | 403 => Self::Auth,
            404 => Self::NotFound,
            400 => Self::BadRequest,
            500..=599 => Self::Transient,
            _ => Self::Unknown,
        }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Document-store failure with category and context
#[derive(Debug, Clone, Error)]
#[error("[{category}] {operation}: {message}")]
pub struct StoreError {
    /// Failure category for retry decisions
    pub category: StoreErrorCategory,
    /// Store operation that failed (e.g. "sampleDocuments")
    pub operation: String,
    /// Detailed error message
    pub message: String,
}

impl StoreError {
    pub fn new(
        category: StoreErrorCategory,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Network-category error, the common case for transport failures
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StoreErrorCategory::Network, operation, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum MapError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Structured document-store error with category
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Per-container sampling failure; the run continues without this container
    #[error("Sampling failed for {database}/{container}: {message}")]
    Sampling {
        database: String,
        container: String,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Operation timed out after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Analysis cancelled")]
    Cancelled,

    /// Unrecoverable setup failure (cannot enumerate databases)
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl MapError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a per-container sampling error
    pub fn sampling(
        database: impl Into<String>,
        container: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Sampling {
            database: database.into(),
            container: container.into(),
            message: message.into(),
        }
    }

    /// Check if this error should abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Fatal(_) | Self::Config(_) | Self::Cancelled | Self::UnknownFormat(_)
        )
    }

    /// Check if the underlying store call can be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Http(_) | Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(StoreErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(StoreErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(StoreErrorCategory::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn test_category_retryable() {
        assert!(StoreErrorCategory::RateLimit.is_retryable());
        assert!(StoreErrorCategory::Network.is_retryable());
        assert!(StoreErrorCategory::Transient.is_retryable());
        assert!(!StoreErrorCategory::Auth.is_retryable());
        assert!(!StoreErrorCategory::BadRequest.is_retryable());
        assert!(!StoreErrorCategory::NotFound.is_retryable());
    }

    #[test]
    fn test_from_http_status() {
        assert_eq!(
            StoreErrorCategory::from_http_status(429),
            StoreErrorCategory::RateLimit
        );
        assert_eq!(
            StoreErrorCategory::from_http_status(401),
            StoreErrorCategory::Auth
        );
        assert_eq!(
            StoreErrorCategory::from_http_status(404),
            StoreErrorCategory::NotFound
        );
        assert_eq!(
            StoreErrorCategory::from_http_status(503),
            StoreErrorCategory::Transient
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::new(
            StoreErrorCategory::RateLimit,
            "sampleDocuments",
            "throttled",
        );
        assert_eq!(err.to_string(), "[RATE_LIMIT] sampleDocuments: throttled");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(MapError::Fatal("cannot list databases".into()).is_fatal());
        assert!(MapError::Config("missing endpoint".into()).is_fatal());
        assert!(!MapError::sampling("db", "orders", "boom").is_fatal());
    }
}
