use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::client::models::{User, UserId, UserInput};
use crate::client::{ClientError, Result, UserApi};

/// REST client for a remote user service.
///
/// Resources live under `{base_url}/users` and `{base_url}/users/{id}`.
#[derive(Debug, Clone)]
pub struct HttpUserApi {
    http: Client,
    base_url: Url,
}

impl HttpUserApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    fn users_url(&self, id: Option<&UserId>) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

/// Decodes a body that may legitimately be empty or `null`.
async fn read_optional<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let body = response.text().await?;
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<T>>(body)?)
}

fn not_found_as(id: &UserId, err: ClientError) -> ClientError {
    match err {
        ClientError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
            ClientError::NotFound(id.clone())
        }
        other => other,
    }
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list_users(&self) -> Result<Option<Vec<User>>> {
        let url = self.users_url(None);
        debug!(%url, "listing users");
        let response = ensure_success(self.http.get(url).send().await?).await?;
        read_optional(response).await
    }

    async fn create_user(&self, input: UserInput) -> Result<Option<User>> {
        let url = self.users_url(None);
        debug!(%url, "creating user");
        let response = ensure_success(self.http.post(url).json(&input).send().await?).await?;
        read_optional(response).await
    }

    async fn update_user(&self, id: &UserId, input: UserInput) -> Result<Option<User>> {
        let url = self.users_url(Some(id));
        debug!(%url, "updating user");
        let response = ensure_success(self.http.put(url).json(&input).send().await?)
            .await
            .map_err(|e| not_found_as(id, e))?;
        read_optional(response).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<()> {
        let url = self.users_url(Some(id));
        debug!(%url, "deleting user");
        ensure_success(self.http.delete(url).send().await?)
            .await
            .map_err(|e| not_found_as(id, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::Role;
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode as AxumStatus,
        routing::{delete, get},
    };
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn client(base_url: &str) -> HttpUserApi {
        HttpUserApi::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn list_users_decodes_numeric_ids() {
        let users = Router::new().route(
            "/users",
            get(|| async {
                Json(serde_json::json!([
                    {"id": 1, "name": "Ann", "email": "ann@x.com", "role": "Admin"}
                ]))
            }),
        );
        let base = spawn(Router::new().nest("/api", users)).await;

        let listed = client(&base).list_users().await.unwrap().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, UserId::from("1"));
        assert_eq!(listed[0].role, Role::Admin);
    }

    #[tokio::test]
    async fn null_list_is_absent() {
        let users = Router::new().route("/users", get(|| async { "null" }));
        let base = spawn(Router::new().nest("/api", users)).await;

        assert_eq!(client(&base).list_users().await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_sends_payload_and_accepts_empty_body() {
        let received: Arc<Mutex<Vec<UserInput>>> = Arc::default();
        let sink = received.clone();
        let users = Router::new().route(
            "/users",
            axum::routing::post(move |Json(input): Json<UserInput>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(input);
                    AxumStatus::NO_CONTENT
                }
            }),
        );
        let base = spawn(Router::new().nest("/api", users)).await;

        let input = UserInput {
            name: "Bo".to_string(),
            email: "bo@x.com".to_string(),
            role: Role::Manager,
        };
        let created = client(&base).create_user(input.clone()).await.unwrap();

        assert_eq!(created, None);
        assert_eq!(*received.lock().unwrap(), vec![input]);
    }

    #[tokio::test]
    async fn delete_hits_id_path_and_maps_404() {
        let users = Router::new().route(
            "/users/{id}",
            delete(|Path(id): Path<String>| async move {
                if id == "42" {
                    AxumStatus::NO_CONTENT
                } else {
                    AxumStatus::NOT_FOUND
                }
            }),
        );
        let base = spawn(Router::new().nest("/api", users)).await;
        let api = client(&base);

        api.delete_user(&UserId::from("42")).await.unwrap();
        let err = api.delete_user(&UserId::from("7")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(id) if id.as_str() == "7"));
    }

    #[tokio::test]
    async fn server_error_surfaces_status() {
        let users = Router::new().route(
            "/users",
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn(Router::new().nest("/api", users)).await;

        let err = client(&base).list_users().await.unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn users_url_keeps_base_path() {
        let api = client("http://users.internal/v1/");
        assert_eq!(
            api.users_url(Some(&UserId::from("a b"))).as_str(),
            "http://users.internal/v1/users/a%20b"
        );
        assert!(HttpUserApi::new("not a url", Duration::from_secs(1)).is_err());
    }
}
