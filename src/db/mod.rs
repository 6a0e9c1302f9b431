//! Local SQLite user store, for running the screen without a remote service.

pub mod models;
pub mod repo;

pub use repo::SqliteUserApi;
