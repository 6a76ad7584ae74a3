use serde_json::{Map, Value};

/// Authenticated caller for a request: the verified token payload.
///
/// Inserted by the auth middleware; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalContext {
    claims: Map<String, Value>,
}

impl PrincipalContext {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn username(&self) -> Option<&Value> {
        self.claims.get("username")
    }

    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }
}
