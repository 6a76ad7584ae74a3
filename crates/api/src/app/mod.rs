//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: token signer + outbound HTTP client shared by handlers
//! - `routes/`: HTTP routes + handlers (one file per endpoint family)
//! - `body/`: request-body extraction and bracket-key form expansion
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent `{ "error": ... }` responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use vulndemo_auth::Hs256Jwt;

use crate::middleware;

pub mod body;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(jwt_secret: &str) -> Router {
    let jwt = Arc::new(Hs256Jwt::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt: jwt.clone() };

    let services = Arc::new(services::AppServices::new(jwt));

    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body::BODY_LIMIT_BYTES)),
        )
}
