use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::client::models::{User, UserId, UserInput};
use crate::client::{self, ClientError, UserApi};
use crate::db::models::UserRecord;

pub async fn create_user_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>("SELECT * FROM users ORDER BY created_at, rowid")
        .fetch_all(pool)
        .await
}

pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(pool: &SqlitePool, user: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.role)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the number of rows touched.
pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    input: &UserInput,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET name = ?, email = ?, role = ? WHERE id = ?")
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.role.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Returns the number of rows removed.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// [`UserApi`] backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteUserApi {
    pool: SqlitePool,
}

impl SqliteUserApi {
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives exactly as long as its one connection.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        create_user_table(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl UserApi for SqliteUserApi {
    async fn list_users(&self) -> client::Result<Option<Vec<User>>> {
        let records = list_users(&self.pool).await?;
        Ok(Some(records.into_iter().map(User::from).collect()))
    }

    async fn create_user(&self, input: UserInput) -> client::Result<Option<User>> {
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            role: input.role.as_str().to_string(),
            created_at: now_millis(),
        };
        insert_user(&self.pool, &record).await?;
        Ok(Some(record.into()))
    }

    async fn update_user(&self, id: &UserId, input: UserInput) -> client::Result<Option<User>> {
        if update_user(&self.pool, id.as_str(), &input).await? == 0 {
            return Err(ClientError::NotFound(id.clone()));
        }
        Ok(get_user(&self.pool, id.as_str()).await?.map(User::from))
    }

    async fn delete_user(&self, id: &UserId) -> client::Result<()> {
        if delete_user(&self.pool, id.as_str()).await? == 0 {
            return Err(ClientError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::Role;

    fn input(name: &str, email: &str, role: Role) -> UserInput {
        UserInput {
            name: name.to_string(),
            email: email.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn create_then_list_keeps_insertion_order() {
        let api = SqliteUserApi::connect("sqlite::memory:").await.unwrap();
        assert_eq!(api.list_users().await.unwrap(), Some(vec![]));

        let ann = api
            .create_user(input("Ann", "ann@x.com", Role::Admin))
            .await
            .unwrap()
            .unwrap();
        api.create_user(input("Bo", "bo@x.com", Role::Manager))
            .await
            .unwrap();

        let users = api.list_users().await.unwrap().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0], ann);
        assert_eq!(users[1].name, "Bo");
        assert_eq!(users[1].role, Role::Manager);
    }

    #[tokio::test]
    async fn update_in_place() {
        let api = SqliteUserApi::connect("sqlite::memory:").await.unwrap();
        let ann = api
            .create_user(input("Ann", "ann@x.com", Role::User))
            .await
            .unwrap()
            .unwrap();

        let updated = api
            .update_user(&ann.id, input("Ann B", "annb@x.com", Role::Admin))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, ann.id);
        assert_eq!(updated.email, "annb@x.com");
        assert_eq!(api.list_users().await.unwrap().unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let api = SqliteUserApi::connect("sqlite::memory:").await.unwrap();
        let ghost = UserId::from("ghost");

        assert!(matches!(
            api.delete_user(&ghost).await,
            Err(ClientError::NotFound(_))
        ));
        assert!(matches!(
            api.update_user(&ghost, input("x", "y", Role::User)).await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let api = SqliteUserApi::connect("sqlite::memory:").await.unwrap();
        let ann = api
            .create_user(input("Ann", "ann@x.com", Role::User))
            .await
            .unwrap()
            .unwrap();

        api.delete_user(&ann.id).await.unwrap();
        assert_eq!(api.list_users().await.unwrap(), Some(vec![]));
    }
}
