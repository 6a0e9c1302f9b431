use sqlx::FromRow;

use crate::client::models::{Role, User, UserId};

/// Row shape of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: i64,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: UserId::from(record.id),
            name: record.name,
            email: record.email,
            // rows are only ever written from a Role
            role: record.role.parse().unwrap_or(Role::User),
        }
    }
}
