// Error taxonomy for the auth core.
//
// `ApiError` is what reaches the wire: an HTTP status, a machine-readable
// code, and a human-readable message. `AuthError` covers internal and
// configuration failures that never map to a single request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable error codes exposed in JSON error bodies.
///
/// Credential failures deliberately share one code so responses never reveal
/// whether the email or the password was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidEmailOrPassword,
    Unauthorized,
    InvalidState,
    ProviderNotFound,
    FailedToFetchUserData,
    FailedToCreateUser,
    FailedToCreateSession,
    InvalidRedirectUrl,
    CouldNotParseBody,
    NotFound,
    InternalServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidEmailOrPassword => "Invalid email or password",
            Self::Unauthorized => "Unauthorized",
            Self::InvalidState => "Invalid state",
            Self::ProviderNotFound => "Provider not supported",
            Self::FailedToFetchUserData => "Failed to fetch user data",
            Self::FailedToCreateUser => "Failed to create user",
            Self::FailedToCreateSession => "Failed to create session",
            Self::InvalidRedirectUrl => "Invalid redirect URL",
            Self::CouldNotParseBody => "Could not parse request body",
            Self::NotFound => "Not found",
            Self::InternalServerError => "Internal server error",
        };
        write!(f, "{msg}")
    }
}

/// HTTP status codes used by the handler layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpStatus {
    Ok = 200,
    NoContent = 204,
    Found = 302,
    BadRequest = 400,
    Unauthorized = 401,
    NotFound = 404,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn status_code(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

/// A request-level error: status + code + message.
///
/// Every handler error converges here before being serialized, so no failure
/// can escape as a framework default page.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status} {code:?}: {message}")]
pub struct ApiError {
    pub status: HttpStatus,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: HttpStatus, code: ErrorCode) -> Self {
        Self {
            message: code.to_string(),
            status,
            code,
        }
    }

    pub fn bad_request(code: ErrorCode) -> Self {
        Self::new(HttpStatus::BadRequest, code)
    }

    pub fn unauthorized(code: ErrorCode) -> Self {
        Self::new(HttpStatus::Unauthorized, code)
    }

    pub fn not_found(code: ErrorCode) -> Self {
        Self::new(HttpStatus::NotFound, code)
    }

    pub fn internal(code: ErrorCode) -> Self {
        Self::new(HttpStatus::InternalServerError, code)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// JSON body for the error response.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message,
            "code": self.code,
        })
    }
}

/// Internal (non-request) error: configuration, crypto, startup wiring.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_json_shape() {
        let err = ApiError::unauthorized(ErrorCode::InvalidEmailOrPassword);
        let json = err.to_json();
        assert_eq!(json["error"], "Invalid email or password");
        assert_eq!(json["code"], "INVALID_EMAIL_OR_PASSWORD");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(HttpStatus::Ok.status_code(), 200);
        assert_eq!(HttpStatus::NoContent.status_code(), 204);
        assert_eq!(HttpStatus::Found.status_code(), 302);
        assert_eq!(HttpStatus::Unauthorized.status_code(), 401);
    }

    #[test]
    fn test_credential_failures_share_one_message() {
        // Unknown email and wrong password must be indistinguishable.
        let a = ApiError::unauthorized(ErrorCode::InvalidEmailOrPassword);
        let b = ApiError::unauthorized(ErrorCode::InvalidEmailOrPassword);
        assert_eq!(a.message, b.message);
    }
}
