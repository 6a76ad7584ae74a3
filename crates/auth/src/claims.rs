use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Lifetime of an issued token.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// Claims minted on login.
///
/// `username` is carried through as whatever JSON value the caller supplied;
/// no shape or format is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: Value,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiry (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(username: Value, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            username,
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("jwt expired")]
    Expired,

    #[error("jwt not active")]
    NotYetValid,

    #[error("invalid {0} value")]
    InvalidClaim(&'static str),
}

/// Deterministically validate the time-window claims of a decoded payload.
///
/// Both `exp` and `nbf` are optional: a payload without `exp` never expires.
/// Signature verification happens before this, in [`crate::token`].
pub fn validate_claims(payload: &Map<String, Value>, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp() as f64;

    if let Some(nbf) = payload.get("nbf") {
        let nbf = nbf.as_f64().ok_or(TokenValidationError::InvalidClaim("nbf"))?;
        if nbf > now {
            return Err(TokenValidationError::NotYetValid);
        }
    }

    if let Some(exp) = payload.get("exp") {
        let exp = exp.as_f64().ok_or(TokenValidationError::InvalidClaim("exp"))?;
        if now >= exp {
            return Err(TokenValidationError::Expired);
        }
    }

    Ok(())
}
