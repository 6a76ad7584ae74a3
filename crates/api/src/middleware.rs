use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use vulndemo_auth::JwtValidator;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::MissingToken)?;

    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(ApiError::InvalidToken)?;

    tracing::debug!(username = ?claims.get("username"), "token accepted");
    req.extensions_mut().insert(PrincipalContext::new(claims));

    Ok(next.run(req).await)
}

/// Second space-separated field of `Authorization: Bearer <token>`.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;

    let mut parts = header.split(' ');
    if parts.next() != Some("Bearer") {
        return None;
    }

    parts.next().filter(|token| !token.is_empty())
}
