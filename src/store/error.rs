use thiserror::Error;

/// Errors surfaced by store operations.
///
/// Every variant is local to the operation that raised it; the daemon turns
/// it into an error envelope and keeps serving.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A collection's persisted JSON could not be read back as its record type.
    #[error("corrupt collection {key}: {reason}")]
    CorruptStore { key: String, reason: String },

    /// Input rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    /// A foreign-key-like reference does not resolve.
    #[error("{entity} not found: {id}")]
    ReferenceNotFound { entity: &'static str, id: String },

    #[error("student {student_id} already submitted assignment {assignment_id}")]
    DuplicateSubmission {
        assignment_id: String,
        student_id: String,
    },

    /// Role or ownership gate refused the caller.
    #[error("{0}")]
    Forbidden(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Stable error code used in IPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::CorruptStore { .. } => "corrupt_store",
            StoreError::Validation(_) => "bad_params",
            StoreError::ReferenceNotFound { .. } => "not_found",
            StoreError::DuplicateSubmission { .. } => "duplicate_submission",
            StoreError::Forbidden(_) => "forbidden",
            StoreError::InvalidCredentials => "invalid_credentials",
            StoreError::Conflict(_) => "conflict",
            StoreError::Storage(_) => "db_failed",
            StoreError::Serialization(_) => "serialization_failed",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
