//! Credential store holding the one configured administrator.

use crate::auth::models::AuthUser;
use crate::config::AdminConfig;

/// Immutable administrator identity injected at startup.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    email: String,
    password: String,
}

impl CredentialStore {
    pub fn new(admin: &AdminConfig) -> Self {
        Self {
            email: admin.email.clone(),
            password: admin.password.clone(),
        }
    }

    /// Exact comparison against the configured identity.
    ///
    /// The password is compared in plaintext and failures are not counted or
    /// throttled; both are known gaps for a production deployment.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<AuthUser> {
        if email == self.email && password == self.password {
            Some(AuthUser::admin(email.to_string()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(&AdminConfig {
            email: "admin@x.com".to_string(),
            password: "secret".to_string(),
        })
    }

    #[test]
    fn test_matching_credentials_authenticate() {
        let user = store().authenticate("admin@x.com", "secret").unwrap();
        assert_eq!(user.email, "admin@x.com");
        assert!(user.is_admin);
    }

    #[test]
    fn test_any_mismatch_fails_closed() {
        let store = store();
        for (email, password) in [
            ("admin@x.com", "Secret"),
            ("admin@x.com", ""),
            ("Admin@x.com", "secret"),
            ("admin@x.com ", "secret"),
            ("other@x.com", "secret"),
            ("", ""),
        ] {
            assert!(store.authenticate(email, password).is_none(), "{email:?}/{password:?}");
        }
    }
}
