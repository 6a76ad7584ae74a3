use std::sync::Arc;

use axum::{extract::Extension, Json};
use chrono::Utc;

use crate::app::body::RequestBody;
use crate::app::dto::{LoginResponse, ProtectedResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Any truthy username/password pair gets a token; nothing is checked.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: RequestBody,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(_password)) = (body.truthy("username"), body.truthy("password")) else {
        return Err(ApiError::InvalidCredentials);
    };

    let token = services
        .jwt
        .issue(username.clone(), Utc::now())
        .map_err(ApiError::Sign)?;

    tracing::info!(username = %username, "token issued");
    Ok(Json(LoginResponse { token }))
}

pub async fn protected(Extension(principal): Extension<PrincipalContext>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "Access granted",
        user: principal.into_claims(),
    })
}
