// AuthOptions — top-level configuration for the auth core.
//
// Validation runs once at context construction; a misconfigured secret is a
// startup failure, never a request-time one.

use serde::{Deserialize, Serialize};

/// Session lifetime: 30 days.
pub const DEFAULT_SESSION_EXPIRES_IN: u64 = 60 * 60 * 24 * 30;

/// Top-level configuration for torii.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOptions {
    /// Server-side secret used as the password-hashing pepper.
    pub secret: String,

    /// Public base URL of the server hosting the auth routes.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix for all auth routes.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime configuration.
    #[serde(default)]
    pub session: SessionOptions,

    /// Production mode: session and transient cookies get the `Secure`
    /// attribute, and the mobile deep-link proxy hop is disabled.
    #[serde(default)]
    pub production: bool,

    /// Public tunnel host used in development to reach mobile deep links
    /// from outside localhost (host only, e.g. "abc123.ngrok.app").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_proxy_host: Option<String>,

    /// Non-HTTP schemes `redirect_to` may use (native app deep links).
    #[serde(default = "default_redirect_schemes")]
    pub allowed_redirect_schemes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Session TTL in seconds. The sliding-refresh threshold is half of it.
    pub expires_in: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            expires_in: DEFAULT_SESSION_EXPIRES_IN,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_base_path() -> String {
    "/api/auth".to_string()
}

fn default_cookie_name() -> String {
    "auth_token".to_string()
}

fn default_redirect_schemes() -> Vec<String> {
    vec!["exp".to_string()]
}

impl AuthOptions {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            base_url: default_base_url(),
            base_path: default_base_path(),
            cookie_name: default_cookie_name(),
            session: SessionOptions::default(),
            production: false,
            auth_proxy_host: None,
            allowed_redirect_schemes: default_redirect_schemes(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Validate the configuration. Called once at startup.
    pub fn validate(&self) -> Result<(), crate::error::AuthError> {
        if self.secret.is_empty() {
            return Err(crate::error::AuthError::Config(
                "auth secret must be configured".into(),
            ));
        }
        if self.production && self.secret.len() < 32 {
            return Err(crate::error::AuthError::Config(
                "auth secret must be at least 32 characters in production".into(),
            ));
        }
        if self.session.expires_in == 0 {
            return Err(crate::error::AuthError::Config(
                "session expiresIn must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AuthOptions::new("test-secret");
        assert_eq!(options.base_path, "/api/auth");
        assert_eq!(options.cookie_name, "auth_token");
        assert_eq!(options.session.expires_in, 60 * 60 * 24 * 30);
        assert!(!options.production);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let options = AuthOptions::new("");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_short_secret_rejected_in_production() {
        let options = AuthOptions::new("short").with_production(true);
        assert!(options.validate().is_err());

        let options = AuthOptions::new("short");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut options = AuthOptions::new("test-secret");
        options.session.expires_in = 0;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let options: AuthOptions =
            serde_json::from_str(r#"{"secret": "from-config-file"}"#).unwrap();
        assert_eq!(options.secret, "from-config-file");
        assert_eq!(options.cookie_name, "auth_token");
        assert_eq!(options.allowed_redirect_schemes, vec!["exp"]);
    }
}
