//! JWT Token Service
//!
//! Handles JWT creation and validation for the administrator session. Tokens are
//! stateless: nothing is stored server-side and there is no revocation list.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// JWT Claims structure binding the subject to an absolute expiry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Administrator email
    pub sub: String,
    /// Token issued at timestamp
    pub iat: i64,
    /// Token expiration timestamp
    pub exp: i64,
}

/// JWT Service for token operations
#[derive(Clone)]
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service from the signing configuration
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.secret_key.as_bytes();

        let mut validation = Validation::new(config.algorithm);
        // Expiry is exact: a token is dead the second its ttl runs out.
        validation.leeway = 0;

        Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::minutes(config.access_token_expire_minutes),
        }
    }

    /// Generate a token for `subject` with the configured lifetime
    pub fn create_token(&self, subject: &str) -> Result<String> {
        self.create_token_with_ttl(subject, self.ttl)
    }

    /// Generate a token for `subject` that expires `ttl` from now
    pub fn create_token_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String> {
        self.encode_at(subject, Utc::now(), ttl)
    }

    fn encode_at(&self, subject: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Validate a token and return its subject.
    ///
    /// Malformed, tampered and expired tokens all yield `None`; the reason is
    /// only visible in debug logs.
    pub fn verify(&self, token: &str) -> Option<String> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(data.claims.sub),
            Ok(_) => {
                tracing::debug!("JWT rejected: empty subject");
                None
            }
            Err(e) => {
                tracing::debug!("JWT rejected: {:?}", e.kind());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(secret: &str, algorithm: Algorithm) -> JwtService {
        JwtService::new(&AuthConfig {
            secret_key: secret.to_string(),
            algorithm,
            access_token_expire_minutes: 30,
        })
    }

    fn service() -> JwtService {
        service_with("test_secret", Algorithm::HS256)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt_service = service();
        let token = jwt_service.create_token("admin@x.com").unwrap();
        assert_eq!(jwt_service.verify(&token).as_deref(), Some("admin@x.com"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt_service = service();
        let ttl = Duration::minutes(30);
        let issued_long_ago = Utc::now() - ttl - Duration::seconds(5);
        let token = jwt_service.encode_at("admin@x.com", issued_long_ago, ttl).unwrap();
        assert!(jwt_service.verify(&token).is_none());
    }

    #[test]
    fn test_negative_ttl_is_already_expired() {
        let jwt_service = service();
        let token = jwt_service
            .create_token_with_ttl("admin@x.com", Duration::seconds(-10))
            .unwrap();
        assert!(jwt_service.verify(&token).is_none());
    }

    #[test]
    fn test_tampered_tokens_rejected() {
        let jwt_service = service();
        let token = jwt_service.create_token("admin@x.com").unwrap();

        let reversed: String = token.chars().rev().collect();
        assert!(jwt_service.verify(&reversed).is_none());

        // Flip one character in every segment in turn.
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        for idx in 0..3 {
            let mut parts: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
            let mut bytes = parts[idx].clone().into_bytes();
            let mid = bytes.len() / 2;
            bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
            parts[idx] = String::from_utf8(bytes).unwrap();
            assert!(jwt_service.verify(&parts.join(".")).is_none(), "segment {idx}");
        }
    }

    #[test]
    fn test_foreign_secret_or_algorithm_rejected() {
        let token = service_with("other_secret", Algorithm::HS256)
            .create_token("admin@x.com")
            .unwrap();
        assert!(service().verify(&token).is_none());

        let token = service_with("test_secret", Algorithm::HS512)
            .create_token("admin@x.com")
            .unwrap();
        assert!(service().verify(&token).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        let jwt_service = service();
        for token in ["", "abc", "a.b.c", "...."] {
            assert!(jwt_service.verify(token).is_none());
        }
    }
}
