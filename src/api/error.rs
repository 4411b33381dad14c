//! Translation of service errors into HTTP responses

use crate::error::{error_kind, ErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Any error surfaced by an API handler
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        error_kind(&self.0)
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.kind())
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ExternalService => StatusCode::BAD_GATEWAY,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::Internal => {
                error!("Internal error while handling request: {:#}", self.0);
                "Internal server error".to_string()
            }
            _ => {
                warn!("Request rejected ({}): {}", kind.as_str(), self.0);
                self.0.to_string()
            }
        };

        (
            status_for(kind),
            Json(json!({ "error": message, "kind": kind.as_str() })),
        )
            .into_response()
    }
}
