//! Error types for the Tidepool domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Tidepool operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller-side validation ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Unresolved entity references ---
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    // --- External collaborator failures ---
    #[error("External service error: {0}")]
    External(#[from] ExternalServiceError),

    // --- Persisted state ---
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A required field the store does not self-guard; callers validate before
/// invoking factory operations.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{entity} name must not be empty")]
    EmptyName { entity: &'static str },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

/// An ID that failed to resolve where the operation cannot proceed without
/// it. Store CRUD never raises these — unresolved IDs are simply absent from
/// results; chat preconditions do.
#[derive(Debug, Clone, Error)]
pub enum ReferenceError {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Thread not found: {thread_id} in workspace {workspace_id}")]
    ThreadNotFound {
        workspace_id: String,
        thread_id: String,
    },

    #[error("No workspace selected")]
    NoActiveWorkspace,

    #[error("No thread selected in workspace {0}")]
    NoActiveThread(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Knowledge item not found: {0}")]
    ItemNotFound(String),

    #[error("Basin not found: {0}")]
    BasinNotFound(String),
}

/// A completion/extraction/search collaborator failed. Surfaced to the
/// caller as-is; the operation aborts after a single attempt with no retry.
#[derive(Debug, Clone, Error)]
pub enum ExternalServiceError {
    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Content extraction failed: {0}")]
    Extraction(String),

    #[error("Search request failed: {0}")]
    Search(String),

    #[error("No API key configured")]
    MissingApiKey,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt payload for collection '{collection}': {reason}")]
    Corrupt { collection: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_error_displays_both_dimensions() {
        let err = Error::Reference(ReferenceError::ThreadNotFound {
            workspace_id: "ws_1".into(),
            thread_id: "th_9".into(),
        });
        assert!(err.to_string().contains("ws_1"));
        assert!(err.to_string().contains("th_9"));
    }

    #[test]
    fn external_error_displays_cause() {
        let err = Error::External(ExternalServiceError::Completion("503 upstream".into()));
        assert!(err.to_string().contains("503 upstream"));
    }

    #[test]
    fn persistence_error_names_collection() {
        let err = PersistenceError::Corrupt {
            collection: "folders".into(),
            reason: "unexpected EOF".into(),
        };
        assert!(err.to_string().contains("folders"));
        assert!(err.to_string().contains("unexpected EOF"));
    }
}
