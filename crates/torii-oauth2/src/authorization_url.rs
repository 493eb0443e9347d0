// Authorization URL construction.
//
// Builds the provider's authorization endpoint URL as a typed `url::Url`,
// never by string splicing.

use crate::pkce::generate_code_challenge;
use crate::provider::ProviderError;

/// Inputs for building an authorization URL.
#[derive(Debug, Clone)]
pub struct AuthorizationUrlParams<'a> {
    pub authorization_endpoint: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub state: &'a str,
    pub scopes: &'a [String],
    /// When set, an S256 challenge pair is appended.
    pub code_verifier: Option<&'a str>,
}

/// Build the authorization URL with response_type, client_id, state, scope,
/// redirect_uri, and (optionally) the PKCE challenge pair.
pub fn build_authorization_url(params: AuthorizationUrlParams<'_>) -> Result<url::Url, ProviderError> {
    let mut url = url::Url::parse(params.authorization_endpoint)
        .map_err(|e| ProviderError::Url(format!("bad authorization endpoint: {e}")))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", params.client_id)
        .append_pair("state", params.state)
        .append_pair("scope", &params.scopes.join(" "))
        .append_pair("redirect_uri", params.redirect_uri);

    if let Some(verifier) = params.code_verifier {
        let challenge = generate_code_challenge(verifier);
        url.query_pairs_mut()
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", &challenge);
    }

    Ok(url)
}
