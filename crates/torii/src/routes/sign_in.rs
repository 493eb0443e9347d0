// POST /sign-in — credential sign-in.
//
// Unknown email, passwordless (OAuth-only) user, and wrong password all
// produce the same 401; the miss paths run a throwaway hash so response
// times don't reveal which check failed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use torii_core::error::{ApiError, ErrorCode};

use crate::context::AuthContext;
use crate::cookies::{session_cookie, ResponseCookies};
use crate::crypto::password::{hash_password, verify_password};
use crate::handler::{GenericRequest, GenericResponse};

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
}

pub async fn handle_sign_in(
    ctx: Arc<AuthContext>,
    request: &GenericRequest,
) -> Result<GenericResponse, ApiError> {
    let body: SignInRequest = request
        .json()
        .map_err(|_| ApiError::bad_request(ErrorCode::CouldNotParseBody))?;

    let rejected = || ApiError::unauthorized(ErrorCode::InvalidEmailOrPassword);
    let level_timing = || {
        let _ = hash_password(&body.password, &ctx.options.secret);
    };

    let email = body.email.trim().to_lowercase();
    let user = ctx
        .store
        .find_user_by_email(&email)
        .await
        .map_err(|e| super::store_failure(&ctx, "sign-in user lookup", e))?;

    let user = match user {
        Some(user) => user,
        None => {
            level_timing();
            return Err(rejected());
        }
    };

    let stored = match &user.password {
        Some(stored) => stored,
        None => {
            level_timing();
            return Err(rejected());
        }
    };

    // A corrupt stored hash reads as a failed verification, not a 500.
    let valid = verify_password(&body.password, &ctx.options.secret, stored).unwrap_or(false);
    if !valid {
        return Err(rejected());
    }

    let session = ctx.sessions.create(&user.id).await.map_err(|e| {
        ctx.logger.error(&format!("sign-in session create: {e}"));
        ApiError::internal(ErrorCode::FailedToCreateSession)
    })?;

    let mut cookies = ResponseCookies::new();
    cookies.set(
        &ctx.options.cookie_name,
        session_cookie(&session.token, session.expires_at, ctx.options.production),
    );

    Ok(GenericResponse::json_with_cookies(
        200,
        &SignInResponse {
            token: session.token,
        },
        cookies,
    ))
}
