use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("failed to decode token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a bearer token and yields its decoded payload.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Map<String, Value>, TokenError>;
}

/// HMAC-signed JWTs over one process-wide secret.
///
/// Tokens are signed with HS256. Verification accepts any HMAC algorithm the
/// header names, so a token re-signed with HS384/HS512 under the same secret
/// is still honoured.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Sign `{username, iat, exp}` with a one-hour lifetime starting at `now`.
    pub fn issue(&self, username: Value, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims::new(username, now);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Time-window checks run in `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();
        validation
    }
}

impl std::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hs256Jwt").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Map<String, Value>, TokenError> {
        let payload = decode::<Map<String, Value>>(token, &self.decoding, &Self::validation())
            .map_err(TokenError::Decode)?
            .claims;

        validate_claims(&payload, now)?;
        Ok(payload)
    }
}
