// torii-sqlx — Postgres-backed AuthStore.

mod store;

pub use store::SqlxStore;
