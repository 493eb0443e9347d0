// Concrete providers and the startup registry.

pub mod discord;
pub mod google;

use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::OAuthProvider;

pub use discord::DiscordProvider;
pub use google::GoogleProvider;

/// Name-keyed provider set, built once at startup.
///
/// Handlers select a provider with a single `get` — no provider-name
/// matching anywhere else.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.providers.insert(provider.id().to_string(), provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn OAuthProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|k| k.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
