use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod parse;
pub mod proxy;
pub mod render;
pub mod system;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/login", post(auth::login))
        .route("/fetch-url", post(proxy::fetch_url))
        .route("/render-template", post(render::render_template))
        .route("/parse-data", post(parse::parse_data))
}

/// Routes behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new().route("/protected", get(auth::protected))
}
