use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use vulndemo_auth::TokenError;
use vulndemo_template::RenderError;

use crate::app::services::FetchError;

/// Every failure a handler can surface.
///
/// Messages are deliberately coarse for auth and deliberately raw for
/// downstream failures: the underlying fetch/render error text reaches the
/// caller unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken(#[source] TokenError),

    #[error("{0}")]
    Sign(#[source] TokenError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("template must be a string")]
    TemplateNotString,

    /// The request body could not be read or decoded.
    #[error("{message}")]
    Body { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::MissingToken | ApiError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Sign(_)
            | ApiError::Fetch(_)
            | ApiError::Render(_)
            | ApiError::TemplateNotString => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match &self {
            ApiError::InvalidToken(cause) => {
                tracing::warn!(%status, cause = %cause, "token rejected");
            }
            _ => tracing::warn!(%status, error = %self, "request failed"),
        }
        json_error(status, self.to_string())
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}
