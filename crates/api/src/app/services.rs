//! Shared, immutable per-process services: the token signer and the
//! outbound HTTP client.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use vulndemo_auth::Hs256Jwt;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct AppServices {
    pub jwt: Arc<Hs256Jwt>,
    http: reqwest::Client,
}

impl AppServices {
    pub fn new(jwt: Arc<Hs256Jwt>) -> Self {
        // Default client: follows redirects, no timeout.
        Self {
            jwt,
            http: reqwest::Client::new(),
        }
    }

    /// GET `url` exactly as given and return its body.
    ///
    /// Bodies that parse as JSON come back as JSON; anything else is returned
    /// as a string. Non-2xx statuses are failures.
    pub async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
