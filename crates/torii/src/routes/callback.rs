// GET /oauth/{provider}/callback — finish the authorization-code flow.
//
// The transient cookies are a single-use capability: every exit from this
// handler, success or failure, expires them, so a replayed callback finds
// nothing to match against.

use std::sync::Arc;

use torii_core::error::{ApiError, ErrorCode};

use crate::context::AuthContext;
use crate::cookies::{
    parse_cookies, session_cookie, ResponseCookies, CODE_VERIFIER_COOKIE, REDIRECT_COOKIE,
    STATE_COOKIE,
};
use crate::handler::{GenericRequest, GenericResponse};
use crate::oauth::resolve_user;
use crate::redirect::resolve_redirect;

pub async fn handle_callback(
    ctx: Arc<AuthContext>,
    provider_name: &str,
    request: &GenericRequest,
) -> Result<GenericResponse, ApiError> {
    let provider = ctx
        .providers
        .get(provider_name)
        .ok_or_else(|| ApiError::not_found(ErrorCode::ProviderNotFound))?;

    let params = request.query_params();
    let jar = request
        .header("cookie")
        .map(parse_cookies)
        .unwrap_or_default();

    let mut cookies = ResponseCookies::new();
    cookies.expire_transient(ctx.options.production);

    let fail = |status_error: ApiError, cookies: ResponseCookies| {
        GenericResponse::json_with_cookies(
            status_error.status.status_code(),
            &status_error.to_json(),
            cookies,
        )
    };

    // CSRF / replay check: the state echoed by the provider must match the
    // one parked in the cookie, and the PKCE verifier must still be there.
    let code = params.get("code");
    let state = params.get("state");
    let stored_state = jar.get(STATE_COOKIE).filter(|s| !s.is_empty());
    let code_verifier = jar.get(CODE_VERIFIER_COOKIE).filter(|s| !s.is_empty());

    let (code, code_verifier) = match (code, state, stored_state, code_verifier) {
        (Some(code), Some(state), Some(stored), Some(verifier)) if state == stored => {
            (code, verifier)
        }
        _ => {
            ctx.logger.warn(&format!(
                "oauth {provider_name} callback rejected: state missing or mismatched"
            ));
            return Ok(fail(ApiError::unauthorized(ErrorCode::InvalidState), cookies));
        }
    };

    // The redirect cookie is client-held; re-validate it before use.
    let redirect_to = jar
        .get(REDIRECT_COOKIE)
        .cloned()
        .unwrap_or_else(|| "/".to_string());
    let mut redirect_url = match resolve_redirect(
        &redirect_to,
        &ctx.base_url,
        &ctx.options.allowed_redirect_schemes,
    ) {
        Ok(url) => url,
        Err(error) => return Ok(fail(error, cookies)),
    };

    let profile = match provider.fetch_user_data(code, code_verifier).await {
        Ok(profile) => profile,
        Err(error) => {
            ctx.logger
                .error(&format!("oauth {provider_name}: {}", error.detail()));
            return Ok(fail(
                ApiError::internal(ErrorCode::FailedToFetchUserData),
                cookies,
            ));
        }
    };

    let user = match resolve_user(ctx.store.as_ref(), provider_name, &profile).await {
        Ok(user) => user,
        Err(error) => {
            ctx.logger
                .error(&format!("oauth {provider_name} account linking: {error}"));
            return Ok(fail(
                ApiError::internal(ErrorCode::FailedToCreateUser),
                cookies,
            ));
        }
    };

    let session = match ctx.sessions.create(&user.id).await {
        Ok(session) => session,
        Err(error) => {
            ctx.logger
                .error(&format!("oauth {provider_name} session create: {error}"));
            return Ok(fail(
                ApiError::internal(ErrorCode::FailedToCreateSession),
                cookies,
            ));
        }
    };

    // Cookie-less clients (native apps) land on a different origin and get
    // the raw token as a query parameter instead.
    if redirect_url.origin() != ctx.base_url.origin() {
        redirect_url
            .query_pairs_mut()
            .append_pair("token", &session.token);
    }

    cookies.set(
        &ctx.options.cookie_name,
        session_cookie(&session.token, session.expires_at, ctx.options.production),
    );

    Ok(GenericResponse::redirect_with_cookies(
        redirect_url.as_str(),
        cookies,
    ))
}
