//! Authentication Middleware
//!
//! Axum middleware for bearer token validation and administrator resolution.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{jwt::JwtService, models::AuthUser};
use crate::error::AppError;

/// Authentication middleware that validates bearer tokens and injects the admin
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function guarding every protected route
    pub async fn validate_token(
        State(jwt_service): State<Arc<JwtService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let header_value = req
            .headers()
            .get(header::AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());

        let token = match parse_bearer(header_value) {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("[AuthMiddleware] {} {}: {}", req.method(), req.uri(), err);
                return Err(err);
            }
        };

        let email = match jwt_service.verify(token) {
            Some(email) => email,
            None => {
                tracing::warn!("[AuthMiddleware] {} {}: token verification failed", req.method(), req.uri());
                return Err(AppError::Unauthenticated("Invalid token"));
            }
        };

        tracing::debug!("[AuthMiddleware] Admin resolved: {}", email);

        // Insert the user into request extensions for downstream handlers
        req.extensions_mut().insert(AuthUser::admin(email));

        Ok(next.run(req).await)
    }
}

/// Split an `Authorization` header into its token.
///
/// The value must be exactly two whitespace-separated parts, the first being
/// `Bearer` in any case.
pub fn parse_bearer(header_value: Option<&str>) -> Result<&str, AppError> {
    let value = header_value.ok_or(AppError::Unauthenticated("Not authenticated"))?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    let [scheme, token] = parts.as_slice() else {
        return Err(AppError::Unauthenticated("Invalid authorization header format"));
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthenticated("Invalid authentication scheme"));
    }

    Ok(*token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(header_value: Option<&str>) -> String {
        match parse_bearer(header_value) {
            Err(AppError::Unauthenticated(msg)) => msg.to_string(),
            other => panic!("expected rejection, got {:?}", other.map(str::to_string)),
        }
    }

    #[test]
    fn test_accepts_bearer_in_any_case() {
        assert_eq!(parse_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(parse_bearer(Some("bearer tok")).unwrap(), "tok");
        assert_eq!(parse_bearer(Some("BEARER   tok ")).unwrap(), "tok");
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(rejection(None), "Not authenticated");
        assert_eq!(rejection(Some("")), "Invalid authorization header format");
        assert_eq!(rejection(Some("Bearer")), "Invalid authorization header format");
        assert_eq!(rejection(Some("Bearer a b")), "Invalid authorization header format");
        assert_eq!(rejection(Some("Basic dXNlcjpwYXNz")), "Invalid authentication scheme");
        assert_eq!(rejection(Some("Token abc")), "Invalid authentication scheme");
    }
}
