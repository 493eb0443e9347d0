// Authorization code exchange at the provider's token endpoint.

use crate::provider::{ProviderError, PROVIDER_HTTP_TIMEOUT};
use crate::tokens::TokenResponse;

/// Inputs for the code exchange.
#[derive(Debug, Clone)]
pub struct CodeExchangeParams<'a> {
    pub token_endpoint: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
    pub code_verifier: Option<&'a str>,
}

pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(PROVIDER_HTTP_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Exchange(format!("http client init failed: {e}")))
}

/// Exchange an authorization code (plus PKCE verifier) for tokens.
pub async fn exchange_code(params: CodeExchangeParams<'_>) -> Result<TokenResponse, ProviderError> {
    let client = http_client()?;

    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", params.code),
        ("redirect_uri", params.redirect_uri),
        ("client_id", params.client_id),
        ("client_secret", params.client_secret),
    ];
    if let Some(verifier) = params.code_verifier {
        form.push(("code_verifier", verifier));
    }

    let response = client
        .post(params.token_endpoint)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| ProviderError::Exchange(format!("token endpoint request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Exchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let data: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ProviderError::Exchange(format!("unreadable token response: {e}")))?;

    TokenResponse::from_value(&data)
        .ok_or_else(|| ProviderError::Exchange(format!("no access token in response: {data}")))
}

/// GET a provider's current-user endpoint with a bearer token.
pub async fn fetch_userinfo(
    userinfo_endpoint: &str,
    access_token: &str,
) -> Result<serde_json::Value, ProviderError> {
    let client = http_client()?;

    let response = client
        .get(userinfo_endpoint)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| ProviderError::Profile(format!("userinfo request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Profile(format!(
            "userinfo endpoint returned {status}: {body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::Profile(format!("unreadable userinfo response: {e}")))
}
