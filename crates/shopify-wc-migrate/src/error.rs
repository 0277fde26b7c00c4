//! Error types for the migration library.

use std::time::Duration;
use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wire-level HTTP error (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Retryable failure (rate limit or server error) that exhausted its
    /// retry budget. Recorded as an entity-level failure; the run continues.
    #[error("Transient error after {attempts} attempts: {message}")]
    Transient {
        message: String,
        attempts: u32,
        retry_after: Option<Duration>,
    },

    /// Authentication/authorization failure (401/403). Aborts the run:
    /// no subsequent call can succeed.
    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The platform rejected the request (non-auth 4xx). Not retried.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// An entity depends on another that has not been migrated yet.
    /// Deferred once within the phase, then an entity-level failure.
    #[error("Dependency not ready: {kind} {source_id}")]
    DependencyNotReady { kind: String, source_id: String },

    /// A cross-entity reference has no correlation record.
    /// Deferred once within the phase, then an entity-level failure.
    #[error("Unresolved reference: {kind} {source_id}")]
    UnresolvedReference { kind: String, source_id: String },

    /// Malformed source data. Immediate entity-level failure, not retried.
    #[error("Mapping failed for {kind} {source_id}: {message}")]
    Mapping {
        kind: String,
        source_id: String,
        message: String,
    },

    /// Structural error in the source data graph (e.g. a collection cycle).
    #[error("Structural error: {0}")]
    Structural(String),

    /// Correlation store error.
    #[error("Correlation store error: {0}")]
    Correlation(String),

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create an Auth error from an HTTP status and response body.
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        MigrateError::Auth {
            status,
            message: message.into(),
        }
    }

    /// Create a Rejected error from an HTTP status and response body.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        MigrateError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a Mapping error.
    pub fn mapping(
        kind: impl Into<String>,
        source_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MigrateError::Mapping {
            kind: kind.into(),
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// True if this error must abort the entire run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrateError::Auth { .. } | MigrateError::Config(_) | MigrateError::Cancelled
        )
    }

    /// True if the entity should be requeued for the phase's deferred pass.
    pub fn is_deferrable(&self) -> bool {
        matches!(
            self,
            MigrateError::DependencyNotReady { .. } | MigrateError::UnresolvedReference { .. }
        )
    }

    /// Short kind tag used for report bucketing.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            MigrateError::Config(_) => "config",
            MigrateError::Http(_) => "http",
            MigrateError::Transient { .. } => "transient",
            MigrateError::Auth { .. } => "auth",
            MigrateError::Rejected { .. } => "rejected",
            MigrateError::DependencyNotReady { .. } => "dependency_not_ready",
            MigrateError::UnresolvedReference { .. } => "unresolved_reference",
            MigrateError::Mapping { .. } => "mapping",
            MigrateError::Structural(_) => "structural",
            MigrateError::Correlation(_) => "correlation",
            MigrateError::Io(_) => "io",
            MigrateError::Json(_) => "json",
            MigrateError::Yaml(_) => "yaml",
            MigrateError::Cancelled => "cancelled",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            MigrateError::Auth { .. } => 3,
            MigrateError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_is_fatal() {
        assert!(MigrateError::auth(401, "invalid token").is_fatal());
        assert!(MigrateError::Config("bad".into()).is_fatal());
        assert!(!MigrateError::rejected(422, "invalid sku").is_fatal());
    }

    #[test]
    fn test_deferrable_errors() {
        let dep = MigrateError::DependencyNotReady {
            kind: "category".into(),
            source_id: "42".into(),
        };
        let unref = MigrateError::UnresolvedReference {
            kind: "variant".into(),
            source_id: "7".into(),
        };
        assert!(dep.is_deferrable());
        assert!(unref.is_deferrable());
        assert!(!MigrateError::mapping("product", "1", "no title").is_deferrable());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(MigrateError::Cancelled.kind_tag(), "cancelled");
        assert_eq!(
            MigrateError::Transient {
                message: "503".into(),
                attempts: 4,
                retry_after: None,
            }
            .kind_tag(),
            "transient"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), 2);
        assert_eq!(MigrateError::auth(403, "forbidden").exit_code(), 3);
        assert_eq!(MigrateError::Cancelled.exit_code(), 130);
        assert_eq!(MigrateError::Structural("cycle".into()).exit_code(), 1);
    }
}
