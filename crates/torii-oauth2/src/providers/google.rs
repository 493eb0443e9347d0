// Google (OpenID Connect) provider.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::authorization_url::{build_authorization_url, AuthorizationUrlParams};
use crate::code_exchange::{exchange_code, fetch_userinfo, CodeExchangeParams};
use crate::provider::{OAuthProvider, ProviderConfig, ProviderError, UserProfile};

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const DEFAULT_SCOPES: &[&str] = &["openid", "profile", "email"];

/// Shape of the OIDC userinfo response.
/// https://developers.google.com/identity/protocols/oauth2/openid-connect#obtainuserinfo
#[derive(Debug, Deserialize)]
struct GoogleUser {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    config: ProviderConfig,
}

impl GoogleProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        scopes.extend(self.config.scopes.iter().cloned());
        scopes
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn create_authorization_url(
        &self,
        state: &str,
        code_verifier: &str,
    ) -> Result<Url, ProviderError> {
        build_authorization_url(AuthorizationUrlParams {
            authorization_endpoint: self
                .config
                .authorization_endpoint
                .as_deref()
                .unwrap_or(AUTHORIZATION_ENDPOINT),
            client_id: &self.config.client_id,
            redirect_uri: &self.config.redirect_uri,
            state,
            scopes: &self.scopes(),
            code_verifier: Some(code_verifier),
        })
    }

    async fn fetch_user_data(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<UserProfile, ProviderError> {
        let tokens = exchange_code(CodeExchangeParams {
            token_endpoint: self
                .config
                .token_endpoint
                .as_deref()
                .unwrap_or(TOKEN_ENDPOINT),
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            redirect_uri: &self.config.redirect_uri,
            code,
            code_verifier: Some(code_verifier),
        })
        .await?;

        let data = fetch_userinfo(
            self.config
                .userinfo_endpoint
                .as_deref()
                .unwrap_or(USERINFO_ENDPOINT),
            &tokens.access_token,
        )
        .await?;

        let user: GoogleUser = serde_json::from_value(data)
            .map_err(|e| ProviderError::Profile(format!("unexpected userinfo shape: {e}")))?;
        let email = user
            .email
            .ok_or_else(|| ProviderError::Profile("userinfo carried no email".into()))?;

        Ok(UserProfile {
            provider_account_id: user.sub,
            name: user.name.unwrap_or_else(|| email.clone()),
            email,
            image: user.picture,
        })
    }
}
