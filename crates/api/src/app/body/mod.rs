//! Request-body extraction shared by every POST route.
//!
//! JSON bodies must be an object or array at the top level; urlencoded
//! bodies go through bracket-key expansion ([`nested`]); anything else
//! yields an empty object.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
};
use serde_json::{Map, Value};

use crate::app::errors::ApiError;

pub mod nested;

/// Bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// The parsed request body, whatever its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody(pub Value);

impl RequestBody {
    /// Field `key` if the body is an object and the field is truthy.
    pub fn truthy(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| is_truthy(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return BodyKind::Other;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::UrlEncoded
    } else {
        BodyKind::Other
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(req.headers()) {
            BodyKind::Json => {
                let bytes = read_bytes(req, state).await?;
                if bytes.is_empty() {
                    return Ok(Self(Value::Object(Map::new())));
                }
                check_strict(&bytes)?;

                serde_json::from_slice(&bytes)
                    .map(Self)
                    .map_err(|e| ApiError::Body {
                        status: StatusCode::BAD_REQUEST,
                        message: e.to_string(),
                    })
            }
            BodyKind::UrlEncoded => {
                let bytes = read_bytes(req, state).await?;
                nested::parse_urlencoded(&String::from_utf8_lossy(&bytes))
                    .map(Self)
                    .map_err(|e| ApiError::Body {
                        status: StatusCode::PAYLOAD_TOO_LARGE,
                        message: e.to_string(),
                    })
            }
            BodyKind::Other => Ok(Self(Value::Object(Map::new()))),
        }
    }
}

async fn read_bytes<S>(req: Request, state: &S) -> Result<Bytes, ApiError>
where
    S: Send + Sync,
{
    Bytes::from_request(req, state).await.map_err(|e| ApiError::Body {
        status: e.status(),
        message: e.body_text(),
    })
}

/// Only an object or array may appear at the top level of a JSON body.
fn check_strict(bytes: &[u8]) -> Result<(), ApiError> {
    let first = bytes
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'));

    let message = match first {
        Some(i) if matches!(bytes[i], b'{' | b'[') => return Ok(()),
        Some(i) => {
            let token = String::from_utf8_lossy(&bytes[i..]).chars().next().unwrap_or_default();
            format!("Unexpected token {token} in JSON at position {i}")
        }
        None => "Unexpected end of JSON input".to_string(),
    };

    Err(ApiError::Body {
        status: StatusCode::BAD_REQUEST,
        message,
    })
}

/// JavaScript truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
