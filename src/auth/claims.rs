use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID, decimal
    pub iat: i64,    // issued at (unix timestamp)
    pub nbf: i64,    // not before, equal to iat
    pub exp: i64,    // expires at (unix timestamp), exclusive
    pub jti: String, // token identifier
    pub iss: String, // issuer
    pub aud: String, // audience
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}
