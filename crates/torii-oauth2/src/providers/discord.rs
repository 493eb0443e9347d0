// Discord provider.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::authorization_url::{build_authorization_url, AuthorizationUrlParams};
use crate::code_exchange::{exchange_code, fetch_userinfo, CodeExchangeParams};
use crate::provider::{OAuthProvider, ProviderConfig, ProviderError, UserProfile};

const AUTHORIZATION_ENDPOINT: &str = "https://discord.com/oauth2/authorize";
const TOKEN_ENDPOINT: &str = "https://discord.com/api/oauth2/token";
const USERINFO_ENDPOINT: &str = "https://discord.com/api/users/@me";
const DEFAULT_SCOPES: &[&str] = &["identify", "email"];

/// Shape of the current-user response.
/// https://discord.com/developers/docs/resources/user#get-current-user
#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    email: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DiscordProvider {
    config: ProviderConfig,
}

impl DiscordProvider {
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
impl OAuthProvider for DiscordProvider {
    fn id(&self) -> &str {
        "discord"
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

        let user: DiscordUser = serde_json::from_value(data)
            .map_err(|e| ProviderError::Profile(format!("unexpected user shape: {e}")))?;
        let email = user
            .email
            .ok_or_else(|| ProviderError::Profile("account carried no email".into()))?;

        // Avatar hash → CDN URL; accounts without one get no image.
        let image = user
            .avatar
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", user.id, hash));

        Ok(UserProfile {
            provider_account_id: user.id,
            name: user.username,
            email,
            image,
        })
    }
}
