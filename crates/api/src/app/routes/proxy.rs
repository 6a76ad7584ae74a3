use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde_json::Value;

use crate::app::body::RequestBody;
use crate::app::dto::FetchResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Fetch whatever `url` names. No scheme, host or address checks.
pub async fn fetch_url(
    Extension(services): Extension<Arc<AppServices>>,
    RequestBody(body): RequestBody,
) -> Result<Json<FetchResponse>, ApiError> {
    let url = body.get("url").and_then(Value::as_str).unwrap_or_default();

    tracing::info!(%url, "outbound fetch");
    let data = services.fetch(url).await?;

    Ok(Json(FetchResponse { data }))
}
