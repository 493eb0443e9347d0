// Framework-agnostic HTTP handler layer.
//
// Any web-framework integration converts its request type into
// `GenericRequest`, calls `handle_auth_request`, and converts the returned
// `GenericResponse` back. All routing, cookie work, and error conversion
// happens here; no error escapes as a framework default page.

use std::collections::HashMap;
use std::sync::Arc;

use torii_core::error::{ApiError, ErrorCode};

use crate::context::AuthContext;
use crate::cookies::{parse_cookies, ResponseCookies};
use crate::routes;

// ─── Generic Request ────────────────────────────────────────────

/// A framework-agnostic HTTP request. Header names are lowercased.
#[derive(Debug, Clone)]
pub struct GenericRequest {
    pub method: String,
    /// Full request path including the base path, e.g. "/api/auth/sign-in".
    pub path: String,
    /// Raw query string without the leading '?'.
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl GenericRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        let body = self.body.as_ref().ok_or("request body is empty")?;
        serde_json::from_slice(body).map_err(|e| format!("failed to parse JSON: {e}"))
    }

    /// Extract the candidate session token: session cookie first, then
    /// `Authorization: Bearer`. The single extraction step every route uses.
    pub fn session_token(&self, cookie_name: &str) -> Option<String> {
        if let Some(header) = self.header("cookie") {
            if let Some(token) = parse_cookies(header).get(cookie_name) {
                if !token.is_empty() {
                    return Some(token.clone());
                }
            }
        }
        if let Some(auth) = self.header("authorization") {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
        None
    }

    pub fn query_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(ref query) = self.query {
            for pair in query.split('&') {
                if let Some((key, value)) = pair.split_once('=') {
                    params.insert(
                        urlencoding::decode(key).unwrap_or_default().into_owned(),
                        urlencoding::decode(value).unwrap_or_default().into_owned(),
                    );
                }
            }
        }
        params
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_params().get(name).cloned()
    }
}

// ─── Generic Response ───────────────────────────────────────────

/// A framework-agnostic HTTP response.
#[derive(Debug, Clone)]
pub struct GenericResponse {
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Vec<u8>,
}

impl GenericResponse {
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn json<T: serde::Serialize>(status: u16, data: &T) -> Self {
        let body = serde_json::to_vec(data).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            vec!["application/json".to_string()],
        );
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn json_with_cookies<T: serde::Serialize>(
        status: u16,
        data: &T,
        cookies: ResponseCookies,
    ) -> Self {
        let mut response = Self::json(status, data);
        response.attach_cookies(cookies);
        response
    }

    pub fn redirect(url: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("location".to_string(), vec![url.to_string()]);
        Self {
            status: 302,
            headers,
            body: Vec::new(),
        }
    }

    pub fn redirect_with_cookies(url: &str, cookies: ResponseCookies) -> Self {
        let mut response = Self::redirect(url);
        response.attach_cookies(cookies);
        response
    }

    pub fn from_api_error(error: &ApiError) -> Self {
        Self::json(error.status.status_code(), &error.to_json())
    }

    fn attach_cookies(&mut self, cookies: ResponseCookies) {
        if !cookies.is_empty() {
            self.headers
                .insert("set-cookie".to_string(), cookies.into_headers());
        }
    }

    /// First `Location` header value, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get("location")
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// All `Set-Cookie` header values.
    pub fn set_cookies(&self) -> &[String] {
        self.headers
            .get("set-cookie")
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ─── Dispatch ───────────────────────────────────────────────────

/// Handle one auth request. Never returns an error: every failure is a
/// JSON error response, and every response carries the CORS headers.
pub async fn handle_auth_request(
    ctx: Arc<AuthContext>,
    request: GenericRequest,
) -> GenericResponse {
    let route_path = strip_base_path(&request.path, &ctx.options.base_path);

    let mut response = if request.method == "OPTIONS" {
        GenericResponse::empty(204)
    } else {
        match route_request(ctx.clone(), &route_path, &request).await {
            Ok(response) => response,
            Err(error) => GenericResponse::from_api_error(&error),
        }
    };

    apply_cors_headers(&mut response);
    response
}

async fn route_request(
    ctx: Arc<AuthContext>,
    route_path: &str,
    request: &GenericRequest,
) -> Result<GenericResponse, ApiError> {
    match (request.method.as_str(), route_path) {
        // Session read.
        ("GET", "/") => routes::session::handle_session_read(ctx, request).await,

        // OAuth start and callback.
        ("GET", path) if path.starts_with("/oauth/") => {
            let rest = &path["/oauth/".len()..];
            if let Some(provider) = rest.strip_suffix("/callback") {
                if provider.is_empty() || provider.contains('/') {
                    return Err(ApiError::not_found(ErrorCode::NotFound));
                }
                routes::callback::handle_callback(ctx, provider, request).await
            } else if !rest.is_empty() && !rest.contains('/') {
                routes::oauth_start::handle_oauth_start(ctx, rest, request).await
            } else {
                Err(ApiError::not_found(ErrorCode::NotFound))
            }
        }

        // Credential sign-in / sign-out.
        ("POST", "/sign-in") => routes::sign_in::handle_sign_in(ctx, request).await,
        ("POST", "/sign-out") => routes::sign_out::handle_sign_out(ctx, request).await,

        _ => Err(ApiError::not_found(ErrorCode::NotFound)),
    }
}

fn strip_base_path(path: &str, base_path: &str) -> String {
    let stripped = path.strip_prefix(base_path).unwrap_or(path);
    if stripped.is_empty() {
        "/".to_string()
    } else if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{stripped}")
    }
}

fn apply_cors_headers(response: &mut GenericResponse) {
    let set = |headers: &mut HashMap<String, Vec<String>>, name: &str, value: &str| {
        headers.insert(name.to_string(), vec![value.to_string()]);
    };
    set(&mut response.headers, "access-control-allow-origin", "*");
    set(&mut response.headers, "access-control-request-method", "*");
    set(
        &mut response.headers,
        "access-control-allow-methods",
        "OPTIONS, GET, POST",
    );
    set(&mut response.headers, "access-control-allow-headers", "*");
}

// ─── Tests ──────────────────────────────────────────────────────
