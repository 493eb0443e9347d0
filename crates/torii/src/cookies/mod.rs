// Cookie handling: parsing the `Cookie` header, serializing `Set-Cookie`
// values, and the attribute policies for the session and transient cookies.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Transient OAuth state cookie names.
pub const STATE_COOKIE: &str = "auth_state";
pub const CODE_VERIFIER_COOKIE: &str = "code_verifier";
pub const REDIRECT_COOKIE: &str = "redirect_to";

/// Transient cookies live for 10 minutes.
pub const TRANSIENT_COOKIE_MAX_AGE: i64 = 60 * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes for one `Set-Cookie` value.
#[derive(Debug, Clone)]
pub struct CookieAttributes {
    pub value: String,
    pub max_age: Option<i64>,
    pub expires: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

/// Session cookie: HttpOnly, Lax, Path=/, Secure in production, absolute
/// expiry matching the session row.
pub fn session_cookie(token: &str, expires: DateTime<Utc>, production: bool) -> CookieAttributes {
    CookieAttributes {
        value: token.to_string(),
        max_age: None,
        expires: Some(expires),
        path: Some("/".to_string()),
        secure: production,
        http_only: true,
        same_site: Some(SameSite::Lax),
    }
}

/// Short-lived transient cookie for OAuth state.
pub fn transient_cookie(value: &str, production: bool) -> CookieAttributes {
    CookieAttributes {
        value: value.to_string(),
        max_age: Some(TRANSIENT_COOKIE_MAX_AGE),
        expires: None,
        path: Some("/".to_string()),
        secure: production,
        http_only: true,
        same_site: Some(SameSite::Lax),
    }
}

/// An immediately-expired cookie, used for deletion.
pub fn expired_cookie(production: bool) -> CookieAttributes {
    CookieAttributes {
        value: String::new(),
        max_age: Some(0),
        expires: None,
        path: Some("/".to_string()),
        secure: production,
        http_only: true,
        same_site: Some(SameSite::Lax),
    }
}

/// Parse a `Cookie` request header into name → value.
pub fn parse_cookies(cookie_header: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for cookie in cookie_header.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            map.insert(
                name.trim().to_string(),
                urlencoding::decode(value).map(|v| v.into_owned()).unwrap_or_else(|_| value.to_string()),
            );
        }
    }
    map
}

/// Serialize one cookie into a `Set-Cookie` header value.
pub fn serialize_cookie(name: &str, attrs: &CookieAttributes) -> String {
    let mut parts = vec![format!("{}={}", name, attrs.value)];

    if let Some(max_age) = attrs.max_age {
        parts.push(format!("Max-Age={max_age}"));
    }
    if let Some(expires) = attrs.expires {
        parts.push(format!("Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
    }
    if let Some(ref path) = attrs.path {
        parts.push(format!("Path={path}"));
    }
    if attrs.secure {
        parts.push("Secure".into());
    }
    if attrs.http_only {
        parts.push("HttpOnly".into());
    }
    if let Some(same_site) = attrs.same_site {
        parts.push(format!("SameSite={same_site}"));
    }

    parts.join("; ")
}

/// Accumulates cookies to attach to one response.
#[derive(Debug, Clone, Default)]
pub struct ResponseCookies {
    cookies: Vec<(String, CookieAttributes)>,
}

impl ResponseCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, attrs: CookieAttributes) {
        self.cookies.push((name.to_string(), attrs));
    }

    /// Expire the three transient OAuth cookies.
    pub fn expire_transient(&mut self, production: bool) {
        for name in [STATE_COOKIE, CODE_VERIFIER_COOKIE, REDIRECT_COOKIE] {
            self.set(name, expired_cookie(production));
        }
    }

    /// `Set-Cookie` header values, in insertion order.
    pub fn into_headers(self) -> Vec<String> {
        self.cookies
            .into_iter()
            .map(|(name, attrs)| serialize_cookie(&name, &attrs))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
