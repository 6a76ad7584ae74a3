use serde::Serialize;
use serde_json::{Map, Value};

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: &'static str,
    pub user: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct ParseDataResponse {
    pub message: &'static str,
    pub received: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}
