// End-to-end handler tests: full requests through `handle_auth_request`
// against the in-memory store, with a stub provider standing in for the
// external identity provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use torii::crypto::password::hash_password;
use torii::crypto::token::hash_token;
use torii::handler::{handle_auth_request, GenericRequest, GenericResponse};
use torii::AuthContext;
use torii_core::db::store::{AuthStore, NewUser};
use torii_core::options::AuthOptions;
use torii_core::User;
use torii_memory::MemoryStore;
use torii_oauth2::pkce::generate_code_challenge;
use torii_oauth2::provider::{OAuthProvider, ProviderError, UserProfile};
use torii_oauth2::ProviderRegistry;

const SECRET: &str = "integration-test-secret-0123456789";

// ─── Stub provider ──────────────────────────────────────────────

/// Provider double: a fixed authorization endpoint and a swappable profile,
/// so callback runs need no outbound HTTP.
#[derive(Debug)]
struct StubProvider {
    name: &'static str,
    profile: Arc<Mutex<UserProfile>>,
}

impl StubProvider {
    fn new(name: &'static str) -> (Self, Arc<Mutex<UserProfile>>) {
        let profile = Arc::new(Mutex::new(UserProfile {
            provider_account_id: "acct-1".into(),
            name: "Stub User".into(),
            email: "stub@example.com".into(),
            image: None,
        }));
        (
            Self {
                name,
                profile: profile.clone(),
            },
            profile,
        )
    }
}

#[async_trait]
impl OAuthProvider for StubProvider {
    fn id(&self) -> &str {
        self.name
    }

    fn create_authorization_url(
        &self,
        state: &str,
        code_verifier: &str,
    ) -> Result<Url, ProviderError> {
        let challenge = generate_code_challenge(code_verifier);
        Url::parse_with_params(
            "https://provider.test/authorize",
            &[("state", state), ("code_challenge", challenge.as_str())],
        )
        .map_err(|e| ProviderError::Url(e.to_string()))
    }

    async fn fetch_user_data(
        &self,
        _code: &str,
        _code_verifier: &str,
    ) -> Result<UserProfile, ProviderError> {
        Ok(self.profile.lock().unwrap().clone())
    }
}

// ─── Helpers ────────────────────────────────────────────────────

fn test_context(store: &MemoryStore) -> (Arc<AuthContext>, Arc<Mutex<UserProfile>>) {
    let (provider, profile) = StubProvider::new("stub");
    let registry = ProviderRegistry::new().register(Arc::new(provider));
    let mut options = AuthOptions::new(SECRET);
    options.auth_proxy_host = Some("tunnel.example.dev".into());
    let ctx = AuthContext::new(options, Arc::new(store.clone()), registry).unwrap();
    (ctx, profile)
}

fn request(
    method: &str,
    path: &str,
    query: Option<&str>,
    headers: &[(&str, &str)],
    body: Option<serde_json::Value>,
) -> GenericRequest {
    GenericRequest {
        method: method.to_string(),
        path: path.to_string(),
        query: query.map(|q| q.to_string()),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: body.map(|b| serde_json::to_vec(&b).unwrap()),
    }
}

fn body_json(response: &GenericResponse) -> serde_json::Value {
    serde_json::from_slice(&response.body).unwrap()
}

/// Pull `name=value` out of the response's Set-Cookie headers.
fn cookie_value(response: &GenericResponse, name: &str) -> Option<String> {
    response.set_cookies().iter().find_map(|header| {
        let (pair, _) = header.split_once(';')?;
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}

async fn seed_user(store: &MemoryStore, email: &str, password: &str) -> User {
    store
        .create_user(NewUser {
            name: "Seeded".into(),
            email: email.into(),
            password: Some(hash_password(password, SECRET).unwrap()),
            image: None,
        })
        .await
        .unwrap()
}

/// Run the OAuth callback with matching state cookies, returning the response.
async fn run_callback(ctx: &Arc<AuthContext>, redirect_to: &str) -> GenericResponse {
    let cookies = format!(
        "auth_state=state-ok; code_verifier=verifier-ok; redirect_to={redirect_to}"
    );
    handle_auth_request(
        ctx.clone(),
        request(
            "GET",
            "/api/auth/oauth/stub/callback",
            Some("code=auth-code&state=state-ok"),
            &[("cookie", &cookies)],
            None,
        ),
    )
    .await
}

// ─── CORS and dispatch ──────────────────────────────────────────

#[tokio::test]
async fn options_preflight_is_empty_204_with_cors() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response =
        handle_auth_request(ctx, request("OPTIONS", "/api/auth/sign-in", None, &[], None)).await;

    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
    assert_eq!(
        response.headers.get("access-control-allow-origin"),
        Some(&vec!["*".to_string()])
    );
    assert_eq!(
        response.headers.get("access-control-allow-methods"),
        Some(&vec!["OPTIONS, GET, POST".to_string()])
    );
}

#[tokio::test]
async fn unknown_route_is_404_json_with_cors() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response =
        handle_auth_request(ctx, request("GET", "/api/auth/nope", None, &[], None)).await;

    assert_eq!(response.status, 404);
    assert_eq!(body_json(&response)["code"], "NOT_FOUND");
    assert!(response.headers.contains_key("access-control-allow-origin"));
}

// ─── Session read ───────────────────────────────────────────────

#[tokio::test]
async fn session_read_without_token_is_anonymous() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(ctx, request("GET", "/api/auth", None, &[], None)).await;

    assert_eq!(response.status, 200);
    let body = body_json(&response);
    assert!(body.get("user").is_none());
    assert!(body.get("expires").is_some());
}

#[tokio::test]
async fn session_read_accepts_bearer_header() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);
    let user = seed_user(&store, "bearer@example.com", "Correct1!").await;
    let session = ctx.sessions.create(&user.id).await.unwrap();

    let auth = format!("Bearer {}", session.token);
    let response = handle_auth_request(
        ctx,
        request("GET", "/api/auth", None, &[("authorization", &auth)], None),
    )
    .await;

    assert_eq!(body_json(&response)["user"]["id"], user.id);
}

// ─── Credential sign-in ─────────────────────────────────────────

#[tokio::test]
async fn sign_in_end_to_end() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);
    let user = seed_user(&store, "a@x.com", "Correct1!").await;

    let response = handle_auth_request(
        ctx.clone(),
        request(
            "POST",
            "/api/auth/sign-in",
            None,
            &[],
            Some(serde_json::json!({"email": "a@x.com", "password": "Correct1!"})),
        ),
    )
    .await;

    assert_eq!(response.status, 200);
    let token = body_json(&response)["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    // The Set-Cookie header carries the same raw token.
    assert_eq!(cookie_value(&response, "auth_token"), Some(token.clone()));

    // The store holds its hash, owned by the seeded user.
    let row = store.get_session(&hash_token(&token)).await.unwrap();
    assert_eq!(row.user_id, user.id);

    // And the token round-trips through session read.
    let cookie = format!("auth_token={token}");
    let session_response = handle_auth_request(
        ctx,
        request("GET", "/api/auth", None, &[("cookie", &cookie)], None),
    )
    .await;
    let body = body_json(&session_response);
    assert_eq!(body["user"]["id"], user.id);
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn sign_in_failures_are_indistinguishable() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);
    seed_user(&store, "known@example.com", "Correct1!").await;

    let wrong_password = handle_auth_request(
        ctx.clone(),
        request(
            "POST",
            "/api/auth/sign-in",
            None,
            &[],
            Some(serde_json::json!({"email": "known@example.com", "password": "Wrong1!"})),
        ),
    )
    .await;

    let unknown_email = handle_auth_request(
        ctx,
        request(
            "POST",
            "/api/auth/sign-in",
            None,
            &[],
            Some(serde_json::json!({"email": "nobody@example.com", "password": "Correct1!"})),
        ),
    )
    .await;

    assert_eq!(wrong_password.status, 401);
    assert_eq!(unknown_email.status, 401);
    assert_eq!(body_json(&wrong_password), body_json(&unknown_email));
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn sign_in_with_malformed_body_is_400() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request(
            "POST",
            "/api/auth/sign-in",
            None,
            &[],
            Some(serde_json::json!({"email": "a@x.com"})),
        ),
    )
    .await;

    assert_eq!(response.status, 400);
    assert_eq!(body_json(&response)["code"], "COULD_NOT_PARSE_BODY");
}

// ─── Sign-out ───────────────────────────────────────────────────

#[tokio::test]
async fn sign_out_invalidates_and_clears_cookie() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);
    let user = seed_user(&store, "out@example.com", "Correct1!").await;
    let session = ctx.sessions.create(&user.id).await.unwrap();

    let cookie = format!("auth_token={}", session.token);
    let response = handle_auth_request(
        ctx.clone(),
        request(
            "POST",
            "/api/auth/sign-out",
            None,
            &[("cookie", &cookie)],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, 302);
    assert_eq!(response.location(), Some("/"));
    let cleared = response
        .set_cookies()
        .iter()
        .find(|h| h.starts_with("auth_token="))
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(store.session_count().await, 0);

    // A second sign-out with the dead token is still a clean 302.
    let again = handle_auth_request(
        ctx,
        request(
            "POST",
            "/api/auth/sign-out",
            None,
            &[("cookie", &cookie)],
            None,
        ),
    )
    .await;
    assert_eq!(again.status, 302);
}

// ─── OAuth start ────────────────────────────────────────────────

#[tokio::test]
async fn oauth_start_redirects_with_state_and_transient_cookies() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request(
            "GET",
            "/api/auth/oauth/stub",
            Some("redirect_to=%2Fdashboard"),
            &[],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, 302);
    let location = Url::parse(response.location().unwrap()).unwrap();
    assert_eq!(location.host_str(), Some("provider.test"));

    let state_in_url: String = location
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert!(location.query_pairs().any(|(k, _)| k == "code_challenge"));

    // The state cookie matches the state sent to the provider.
    assert_eq!(cookie_value(&response, "auth_state"), Some(state_in_url));
    assert!(cookie_value(&response, "code_verifier").is_some());
    assert_eq!(
        cookie_value(&response, "redirect_to"),
        Some("/dashboard".to_string())
    );
    assert!(response
        .set_cookies()
        .iter()
        .all(|h| h.contains("Max-Age=600") && h.contains("HttpOnly")));
}

#[tokio::test]
async fn oauth_start_unknown_provider_is_404() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request("GET", "/api/auth/oauth/unknown", None, &[], None),
    )
    .await;
    assert_eq!(response.status, 404);
    assert_eq!(body_json(&response)["code"], "PROVIDER_NOT_FOUND");
}

#[tokio::test]
async fn oauth_start_rejects_foreign_redirect() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request(
            "GET",
            "/api/auth/oauth/stub",
            Some("redirect_to=https%3A%2F%2Fevil.example%2Fphish"),
            &[],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, 400);
    assert_eq!(body_json(&response)["code"], "INVALID_REDIRECT_URL");
}

#[tokio::test]
async fn oauth_start_proxies_deep_links_in_development() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request(
            "GET",
            "/api/auth/oauth/stub",
            Some("redirect_to=exp%3A%2F%2F192.168.1.5%3A8081"),
            &[],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, 302);
    let location = Url::parse(response.location().unwrap()).unwrap();
    assert_eq!(location.host_str(), Some("tunnel.example.dev"));
    assert_eq!(location.path(), "/api/auth/oauth/stub");
    assert!(location
        .query_pairs()
        .any(|(k, v)| k == "redirect_to" && v.starts_with("exp://")));
    // No OAuth state handed out yet on the proxy hop.
    assert!(response.set_cookies().is_empty());
}

// ─── OAuth callback ─────────────────────────────────────────────

#[tokio::test]
async fn callback_with_mismatched_state_creates_nothing() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request(
            "GET",
            "/api/auth/oauth/stub/callback",
            Some("code=auth-code&state=attacker-state"),
            &[(
                "cookie",
                "auth_state=real-state; code_verifier=v; redirect_to=/",
            )],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, 401);
    assert_eq!(body_json(&response)["code"], "INVALID_STATE");

    // No rows were created, and the transient cookies are burned.
    assert_eq!(store.user_count().await, 0);
    assert_eq!(store.account_count().await, 0);
    assert_eq!(store.session_count().await, 0);
    assert!(response
        .set_cookies()
        .iter()
        .any(|h| h.starts_with("auth_state=") && h.contains("Max-Age=0")));
}

#[tokio::test]
async fn callback_without_transient_cookies_is_rejected() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = handle_auth_request(
        ctx,
        request(
            "GET",
            "/api/auth/oauth/stub/callback",
            Some("code=auth-code&state=some-state"),
            &[],
            None,
        ),
    )
    .await;

    assert_eq!(response.status, 401);
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn callback_success_creates_user_account_and_session() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = run_callback(&ctx, "/welcome").await;

    assert_eq!(response.status, 302);
    assert_eq!(
        response.location(),
        Some("http://localhost:3000/welcome")
    );

    assert_eq!(store.user_count().await, 1);
    assert_eq!(store.account_count().await, 1);
    assert_eq!(store.session_count().await, 1);

    // Session cookie set, transient cookies cleared.
    let token = cookie_value(&response, "auth_token").unwrap();
    assert!(store.get_session(&hash_token(&token)).await.is_some());
    assert!(response
        .set_cookies()
        .iter()
        .any(|h| h.starts_with("code_verifier=") && h.contains("Max-Age=0")));

    // Same-origin redirect: no token in the query string.
    assert!(!response.location().unwrap().contains("token="));

    // The cookie authenticates follow-up requests.
    let cookie = format!("auth_token={token}");
    let session_response = handle_auth_request(
        ctx,
        request("GET", "/api/auth", None, &[("cookie", &cookie)], None),
    )
    .await;
    assert_eq!(
        body_json(&session_response)["user"]["email"],
        "stub@example.com"
    );
}

#[tokio::test]
async fn callback_appends_token_for_cross_origin_redirects() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = run_callback(&ctx, "exp://192.168.1.5:8081/--/home").await;

    assert_eq!(response.status, 302);
    let location = response.location().unwrap();
    assert!(location.starts_with("exp://192.168.1.5:8081"));

    let token = cookie_value(&response, "auth_token").unwrap();
    assert!(location.contains(&format!("token={token}")));
}

#[tokio::test]
async fn callback_rejects_tampered_redirect_cookie() {
    let store = MemoryStore::new();
    let (ctx, _) = test_context(&store);

    let response = run_callback(&ctx, "https://evil.example/phish").await;

    assert_eq!(response.status, 400);
    assert_eq!(body_json(&response)["code"], "INVALID_REDIRECT_URL");
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn repeated_callback_for_same_account_reuses_the_user() {
    let store = MemoryStore::new();
    let (ctx, profile) = test_context(&store);

    let first = run_callback(&ctx, "/").await;
    assert_eq!(first.status, 302);
    assert_eq!(store.user_count().await, 1);

    // Same provider account comes back with a drifted email; it must land
    // on the same user, not mint a duplicate.
    profile.lock().unwrap().email = "renamed@example.com".into();
    let second = run_callback(&ctx, "/").await;
    assert_eq!(second.status, 302);

    assert_eq!(store.user_count().await, 1);
    assert_eq!(store.account_count().await, 1);
    let user = store
        .find_user_by_email("stub@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "stub@example.com");
}

#[tokio::test]
async fn second_provider_with_same_email_links_to_existing_user() {
    let store = MemoryStore::new();

    // Two stub providers sharing one registry.
    let (provider_a, _) = StubProvider::new("first");
    let (provider_b, profile_b) = StubProvider::new("second");
    profile_b.lock().unwrap().provider_account_id = "acct-other".into();
    let registry = ProviderRegistry::new()
        .register(Arc::new(provider_a))
        .register(Arc::new(provider_b));
    let ctx = AuthContext::new(
        AuthOptions::new(SECRET),
        Arc::new(store.clone()),
        registry,
    )
    .unwrap();

    for provider in ["first", "second"] {
        let path = format!("/api/auth/oauth/{provider}/callback");
        let response = handle_auth_request(
            ctx.clone(),
            request(
                "GET",
                &path,
                Some("code=auth-code&state=state-ok"),
                &[(
                    "cookie",
                    "auth_state=state-ok; code_verifier=verifier-ok; redirect_to=/",
                )],
                None,
            ),
        )
        .await;
        assert_eq!(response.status, 302);
    }

    // One user, two linked accounts: email is the merge key.
    assert_eq!(store.user_count().await, 1);
    assert_eq!(store.account_count().await, 2);
}
