// torii-oauth2 — OAuth2 authorization-code flow plumbing.
//
// The `OAuthProvider` trait is the seam the auth core dispatches through;
// one implementing type per external identity provider, selected by name
// from a registry built at startup.

pub mod authorization_url;
pub mod code_exchange;
pub mod pkce;
pub mod provider;
pub mod providers;
pub mod tokens;

pub use provider::{OAuthProvider, ProviderConfig, ProviderError, UserProfile};
pub use providers::{DiscordProvider, GoogleProvider, ProviderRegistry};
pub use tokens::TokenResponse;
