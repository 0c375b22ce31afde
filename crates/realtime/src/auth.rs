//! Minimal bearer-token verification.
//!
//! The full OAuth2/argon2 identity provider is an external collaborator, not
//! part of this server — a `Session` only needs to know which authenticated
//! user is on the other end of the socket. Tokens are HS256 JWTs signed by
//! that external provider; this module only decodes and validates them.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub username: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid or expired token")]
    Invalid,
}

pub fn verify_bearer(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation).map(|data| data.claims).map_err(|_| AuthError::Invalid)
}

/// Pulls the token out of `?token=...` (WebSocket upgrades can't set an
/// `Authorization` header from a browser) or an `Authorization: Bearer ...`
/// header, in that order.
pub fn extract_token(query_token: Option<&str>, auth_header: Option<&str>) -> Result<String, AuthError> {
    if let Some(token) = query_token {
        return Ok(token.to_string());
    }
    if let Some(header) = auth_header {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }
    Err(AuthError::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_for(sub: &str, secret: &[u8], exp: usize) -> String {
        let claims = Claims { sub: sub.to_string(), username: Some("tester".into()), exp };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn verifies_a_well_formed_token() {
        let secret = b"test-secret";
        let token = token_for("usr_abc", secret, 9_999_999_999);
        let claims = verify_bearer(&token, secret).unwrap();
        assert_eq!(claims.sub, "usr_abc");
    }

    #[test]
    fn rejects_token_signed_with_wrong_secret() {
        let token = token_for("usr_abc", b"right-secret", 9_999_999_999);
        assert!(verify_bearer(&token, b"wrong-secret").is_err());
    }

    #[test]
    fn extract_token_prefers_query_over_header() {
        let token = extract_token(Some("from-query"), Some("Bearer from-header")).unwrap();
        assert_eq!(token, "from-query");
    }

    #[test]
    fn extract_token_falls_back_to_auth_header() {
        let token = extract_token(None, Some("Bearer from-header")).unwrap();
        assert_eq!(token, "from-header");
    }

    #[test]
    fn extract_token_errors_when_absent() {
        assert!(extract_token(None, None).is_err());
    }
}
