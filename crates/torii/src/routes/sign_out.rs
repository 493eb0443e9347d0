// POST /sign-out — invalidate the presented session and clear its cookie.
//
// Idempotent: a request without a token, or with one that no longer maps to
// a session, still clears the cookie and redirects.

use std::sync::Arc;

use torii_core::error::ApiError;

use crate::context::AuthContext;
use crate::cookies::{expired_cookie, ResponseCookies};
use crate::handler::{GenericRequest, GenericResponse};

pub async fn handle_sign_out(
    ctx: Arc<AuthContext>,
    request: &GenericRequest,
) -> Result<GenericResponse, ApiError> {
    if let Some(token) = request.session_token(&ctx.options.cookie_name) {
        ctx.sessions
            .invalidate(&token)
            .await
            .map_err(|e| super::store_failure(&ctx, "sign-out", e))?;
    }

    let mut cookies = ResponseCookies::new();
    cookies.set(&ctx.options.cookie_name, expired_cookie(ctx.options.production));

    Ok(GenericResponse::redirect_with_cookies("/", cookies))
}
