// Post-login redirect validation.
//
// `redirect_to` is attacker-influenced (query parameter, then a client-held
// cookie), so it is parsed as a typed URL and checked against an allow-list
// before any 302 is emitted: relative paths, same-origin absolute URLs, or
// an explicitly allowed scheme (native app deep links).

use url::Url;

use torii_core::error::{ApiError, ErrorCode};

pub fn resolve_redirect(
    redirect_to: &str,
    base_url: &Url,
    allowed_schemes: &[String],
) -> Result<Url, ApiError> {
    let invalid = || ApiError::bad_request(ErrorCode::InvalidRedirectUrl);

    if redirect_to.is_empty() {
        return base_url.join("/").map_err(|_| invalid());
    }

    // Relative path. "//host" is scheme-relative, not a path — reject it.
    if redirect_to.starts_with('/') && !redirect_to.starts_with("//") {
        return base_url.join(redirect_to).map_err(|_| invalid());
    }

    let url = Url::parse(redirect_to).map_err(|_| invalid())?;

    // Opaque-path URLs ("exp:foo") can't take query parameters; require a
    // real authority even on allow-listed schemes.
    if url.cannot_be_a_base() {
        return Err(invalid());
    }

    if url.origin() == base_url.origin() {
        return Ok(url);
    }
    if allowed_schemes.iter().any(|s| s == url.scheme()) {
        return Ok(url);
    }

    Err(invalid())
}
