//! Authentication Models
//!
//! Data structures for authentication requests, responses, and user information.

use serde::{Deserialize, Serialize};

/// Authenticated identity resolved from a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Every verified subject is the administrator: there is only one identity.
    pub fn admin(email: String) -> Self {
        Self { email, is_admin: true }
    }
}

/// OAuth2 password-flow form posted to the login endpoint
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub grant_type: Option<String>,
}

/// Token response after successful authentication
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn new(access_token: String, user: AuthUser) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user,
        }
    }
}
