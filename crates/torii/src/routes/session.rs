// GET / — session read.
//
// Validates the presented token (sliding refresh happens inside the
// manager) and returns the session JSON. No token, an unknown token, or an
// expired one all resolve to the anonymous result; none is an error.

use std::sync::Arc;

use torii_core::error::ApiError;

use crate::context::AuthContext;
use crate::handler::{GenericRequest, GenericResponse};
use crate::session::SessionResult;

pub async fn handle_session_read(
    ctx: Arc<AuthContext>,
    request: &GenericRequest,
) -> Result<GenericResponse, ApiError> {
    let result = match request.session_token(&ctx.options.cookie_name) {
        Some(token) => ctx
            .sessions
            .validate(&token)
            .await
            .map_err(|e| super::store_failure(&ctx, "session validation", e))?,
        None => SessionResult::anonymous(),
    };

    Ok(GenericResponse::json(200, &result))
}
