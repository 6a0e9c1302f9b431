use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::client::models::{Role, UserId};
use crate::error::AppError;
use crate::view::{Draft, UsersPage};

/// Fields posted by the user form.
#[derive(Debug, Deserialize)]
pub struct DraftForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl From<DraftForm> for Draft {
    fn from(form: DraftForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            role: form.role,
        }
    }
}

fn back_to_screen() -> Redirect {
    Redirect::to("/")
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    state.screen.mount().await;
    let page = UsersPage::from_state(&state.screen.snapshot());
    Ok(Html(page.render()?))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DraftForm>,
) -> impl IntoResponse {
    state.screen.update_draft(form.into());
    state.screen.submit().await;
    back_to_screen()
}

pub async fn edit(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> impl IntoResponse {
    state.screen.begin_edit(&UserId::from(id));
    back_to_screen()
}

pub async fn cancel_edit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.screen.cancel_edit();
    back_to_screen()
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.screen.delete(&UserId::from(id)).await;
    back_to_screen()
}

pub async fn reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.screen.reload().await;
    back_to_screen()
}
