// The OAuthProvider trait and its supporting types.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// Timeout for outbound calls to the provider (token exchange, userinfo).
pub const PROVIDER_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-provider client configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// The callback URL registered with the provider.
    pub redirect_uri: String,
    /// Extra scopes appended to the provider's defaults.
    pub scopes: Vec<String>,
    /// Endpoint overrides, used by tests to point at a local server.
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            authorization_endpoint: None,
            token_endpoint: None,
            userinfo_endpoint: None,
        }
    }
}

/// Canonical profile fields every provider maps its response into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub provider_account_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Provider failures.
///
/// `Display` is deliberately generic — clients see "failed to fetch user
/// data" no matter what went wrong upstream; `detail()` carries the real
/// cause for server-side logging only.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The token endpoint rejected the exchange or was unreachable.
    #[error("failed to fetch user data")]
    Exchange(String),

    /// The userinfo endpoint failed or returned an unusable payload.
    #[error("failed to fetch user data")]
    Profile(String),

    /// The authorization URL could not be constructed.
    #[error("invalid authorization url")]
    Url(String),
}

impl ProviderError {
    pub fn detail(&self) -> &str {
        match self {
            Self::Exchange(d) | Self::Profile(d) | Self::Url(d) => d,
        }
    }
}

/// Capability set each external identity provider implements.
#[async_trait]
pub trait OAuthProvider: Send + Sync + fmt::Debug {
    /// Registry key, e.g. "google".
    fn id(&self) -> &str;

    /// Build the provider's authorization URL with scopes, state, and a
    /// PKCE challenge derived from `code_verifier` where supported.
    fn create_authorization_url(
        &self,
        state: &str,
        code_verifier: &str,
    ) -> Result<Url, ProviderError>;

    /// Exchange the authorization code for an access token, call the
    /// provider's current-user endpoint, and map the response into the
    /// canonical profile shape.
    async fn fetch_user_data(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<UserProfile, ProviderError>;
}
