// OAuth glue owned by the auth core: resolving provider profiles into
// local users. Protocol plumbing lives in torii-oauth2.

pub mod link_account;

pub use link_account::resolve_user;
