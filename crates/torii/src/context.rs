// Auth context — the fully-initialized configuration shared across
// request handlers.
//
// Constructed once at startup from options + an injected store; there is no
// ambient global state. Construction is where configuration failures
// surface, never request handling.

use std::sync::Arc;

use url::Url;

use torii_core::db::store::AuthStore;
use torii_core::error::AuthError;
use torii_core::logger::AuthLogger;
use torii_core::options::AuthOptions;
use torii_oauth2::ProviderRegistry;

use crate::session::SessionManager;

pub struct AuthContext {
    pub options: AuthOptions,
    /// Parsed form of `options.base_url`; origin comparisons run against it.
    pub base_url: Url,
    pub store: Arc<dyn AuthStore>,
    pub sessions: SessionManager,
    pub providers: ProviderRegistry,
    pub logger: AuthLogger,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("base_url", &self.base_url.as_str())
            .field("base_path", &self.options.base_path)
            .field("cookie_name", &self.options.cookie_name)
            .field("secret", &"[REDACTED]")
            .field("providers", &self.providers.names())
            .finish()
    }
}

impl AuthContext {
    pub fn new(
        options: AuthOptions,
        store: Arc<dyn AuthStore>,
        providers: ProviderRegistry,
    ) -> Result<Arc<Self>, AuthError> {
        options.validate()?;

        let base_url = Url::parse(&options.base_url)
            .map_err(|e| AuthError::Config(format!("invalid baseUrl {:?}: {e}", options.base_url)))?;

        let sessions = SessionManager::new(store.clone(), options.session.expires_in);

        Ok(Arc::new(Self {
            base_url,
            sessions,
            store,
            providers,
            logger: AuthLogger::default(),
            options,
        }))
    }
}
