//! The user service the screen talks to.
//!
//! [`UserApi`] is the whole contract: list, create, update and delete. The
//! screen only ever sees this trait, so the backing store can be a remote
//! REST service ([`http::HttpUserApi`]) or the local SQLite store in
//! [`crate::db`].

pub mod http;
pub mod models;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::client::models::{User, UserId, UserInput};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to user service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("user service answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode user service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("user store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid user service url {0}")]
    InvalidBaseUrl(String),

    #[error("user {0} not found")]
    NotFound(UserId),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[async_trait]
pub trait UserApi: Send + Sync {
    /// Full user collection. `None` when the service answers with nothing.
    async fn list_users(&self) -> Result<Option<Vec<User>>>;

    /// Creates a user. Services may or may not echo the new record back.
    async fn create_user(&self, input: UserInput) -> Result<Option<User>>;

    async fn update_user(&self, id: &UserId, input: UserInput) -> Result<Option<User>>;

    async fn delete_user(&self, id: &UserId) -> Result<()>;
}
