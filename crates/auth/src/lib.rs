//! `vulndemo-auth`: token issuance and verification over a single shared secret.
//!
//! This crate is decoupled from HTTP: the API layer extracts the bearer token
//! and maps failures to responses.

pub mod claims;
pub mod token;

pub use claims::{TokenClaims, TokenValidationError, validate_claims, TOKEN_TTL_SECONDS};
pub use token::{Hs256Jwt, JwtValidator, TokenError};
