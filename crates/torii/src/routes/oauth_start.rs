// GET /oauth/{provider} — start the authorization-code flow.
//
// Generates the CSRF state and PKCE verifier, parks them (plus the
// validated redirect target) in short-lived cookies, and 302s to the
// provider. In development, a non-HTTP `redirect_to` (a native app deep
// link) is first bounced through the configured public proxy host so the
// provider's callback can reach it from outside localhost.

use std::sync::Arc;

use url::Url;

use torii_core::error::{ApiError, ErrorCode};
use torii_oauth2::pkce::generate_code_verifier;

use crate::context::AuthContext;
use crate::cookies::{
    transient_cookie, ResponseCookies, CODE_VERIFIER_COOKIE, REDIRECT_COOKIE, STATE_COOKIE,
};
use crate::crypto::random::generate_random_string;
use crate::handler::{GenericRequest, GenericResponse};
use crate::redirect::resolve_redirect;

const STATE_LENGTH: usize = 32;

pub async fn handle_oauth_start(
    ctx: Arc<AuthContext>,
    provider_name: &str,
    request: &GenericRequest,
) -> Result<GenericResponse, ApiError> {
    let provider = ctx
        .providers
        .get(provider_name)
        .ok_or_else(|| ApiError::not_found(ErrorCode::ProviderNotFound))?;

    let redirect_to = request
        .query_param("redirect_to")
        .unwrap_or_else(|| "/".to_string());

    // Native deep links can't be reached by the provider while the server
    // runs on localhost; hop through the public proxy first. Only
    // allow-listed schemes get the hop.
    if let Ok(parsed) = Url::parse(&redirect_to) {
        let deep_link = ctx
            .options
            .allowed_redirect_schemes
            .iter()
            .any(|s| s == parsed.scheme());
        if deep_link && !ctx.options.production {
            let host = ctx.options.auth_proxy_host.as_deref().ok_or_else(|| {
                ctx.logger
                    .error("deep-link redirect requested but authProxyHost is not configured");
                ApiError::internal(ErrorCode::InternalServerError)
            })?;

            let mut proxied = Url::parse(&format!("https://{host}{}", request.path))
                .map_err(|_| ApiError::internal(ErrorCode::InternalServerError))?;
            proxied
                .query_pairs_mut()
                .append_pair("redirect_to", &redirect_to);

            return Ok(GenericResponse::redirect(proxied.as_str()));
        }
    }

    // Reject a bad redirect target before any state is handed out.
    resolve_redirect(
        &redirect_to,
        &ctx.base_url,
        &ctx.options.allowed_redirect_schemes,
    )?;

    let state = generate_random_string(STATE_LENGTH);
    let code_verifier = generate_code_verifier();

    let authorization_url = provider
        .create_authorization_url(&state, &code_verifier)
        .map_err(|e| {
            ctx.logger
                .error(&format!("oauth {provider_name} start: {}", e.detail()));
            ApiError::internal(ErrorCode::InternalServerError)
        })?;

    let production = ctx.options.production;
    let mut cookies = ResponseCookies::new();
    cookies.set(STATE_COOKIE, transient_cookie(&state, production));
    cookies.set(CODE_VERIFIER_COOKIE, transient_cookie(&code_verifier, production));
    cookies.set(REDIRECT_COOKIE, transient_cookie(&redirect_to, production));

    Ok(GenericResponse::redirect_with_cookies(
        authorization_url.as_str(),
        cookies,
    ))
}
