use std::fmt;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::error::SigningError;
use crate::github::models::Claims;

/// GitHub rejects app JWTs valid for longer than ten minutes.
pub const ASSERTION_TTL_SECS: u64 = 600;

/// An RS256-signed app JWT, sent as a bearer credential to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAssertion(String);

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedAssertion(..)")
    }
}

pub fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub fn create_jwt(
    app_id: u64,
    key: &EncodingKey,
    issued_at: u64,
) -> Result<SignedAssertion, SigningError> {
    let exp = issued_at
        .checked_add(ASSERTION_TTL_SECS)
        .ok_or(SigningError::ExpiryOverflow(issued_at))?;
    let claims = Claims {
        iat: issued_at,
        exp,
        iss: app_id.to_string(),
    };
    encode(&Header::new(Algorithm::RS256), &claims, key)
        .map(SignedAssertion)
        .map_err(SigningError::Encode)
}
