//! Error types for the matchmaking service
//!
//! Domain failures are expressed as [`MeshwellError`] and propagated through
//! `anyhow` like every other error in the service. Callers that need to react
//! to a specific kind (the HTTP layer, metrics) recover it with
//! [`error_kind`].

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MeshwellError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("External service error: {message}")]
    ExternalService { message: String },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

/// Coarse classification of a failure, used for status codes and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    ExternalService,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ExternalService => "external_service",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal",
        }
    }
}

impl MeshwellError {
    pub fn validation(reason: impl Into<String>) -> Self {
        MeshwellError::Validation {
            reason: reason.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        MeshwellError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        MeshwellError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn external(message: impl Into<String>) -> Self {
        MeshwellError::ExternalService {
            message: message.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        MeshwellError::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        MeshwellError::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MeshwellError::Validation { .. } => ErrorKind::Validation,
            MeshwellError::Conflict { .. } => ErrorKind::Conflict,
            MeshwellError::NotFound { .. } => ErrorKind::NotFound,
            MeshwellError::ExternalService { .. } => ErrorKind::ExternalService,
            MeshwellError::Unauthorized { .. } => ErrorKind::Unauthorized,
            MeshwellError::Configuration { .. } | MeshwellError::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

/// Classify an `anyhow` error. Anything that is not a [`MeshwellError`] is internal.
pub fn error_kind(error: &anyhow::Error) -> ErrorKind {
    error
        .downcast_ref::<MeshwellError>()
        .map(MeshwellError::kind)
        .unwrap_or(ErrorKind::Internal)
}
