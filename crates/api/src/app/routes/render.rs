use axum::response::Html;
use serde_json::Value;

use crate::app::body::{is_truthy, RequestBody};
use crate::app::errors::ApiError;

/// Render the caller's template against the caller's data.
pub async fn render_template(RequestBody(body): RequestBody) -> Result<Html<String>, ApiError> {
    let template = body
        .get("template")
        .and_then(Value::as_str)
        .ok_or(ApiError::TemplateNotString)?;

    let empty = Value::Null;
    let data = body.get("data").filter(|v| is_truthy(v)).unwrap_or(&empty);

    let rendered = vulndemo_template::render(template, data)?;
    Ok(Html(rendered))
}
