// Per-route handlers, dispatched from `handler::route_request`.

pub mod callback;
pub mod oauth_start;
pub mod session;
pub mod sign_in;
pub mod sign_out;

use torii_core::db::store::StoreError;
use torii_core::error::{ApiError, ErrorCode};

use crate::context::AuthContext;

/// Log a store failure server-side and hand the client a generic 500.
pub(crate) fn store_failure(ctx: &AuthContext, what: &str, error: StoreError) -> ApiError {
    ctx.logger.error(&format!("{what}: {error}"));
    ApiError::internal(ErrorCode::InternalServerError)
}
