// torii — opaque-token session authentication with OAuth2 account linking.
//
// The crate is framework-agnostic: `handler::handle_auth_request` takes a
// `GenericRequest` and returns a `GenericResponse`; web-framework
// integrations convert at the edges.

pub mod context;
pub mod cookies;
pub mod crypto;
pub mod handler;
pub mod oauth;
pub mod redirect;
pub mod routes;
pub mod session;

pub use context::AuthContext;
pub use handler::{handle_auth_request, GenericRequest, GenericResponse};
pub use session::{NewSession, SessionManager, SessionResult};
