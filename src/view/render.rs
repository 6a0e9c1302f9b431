use askama::Template;

use crate::client::models::{Role, User};
use crate::view::screen::{DeleteFailure, ScreenState};

pub const EMPTY_LIST_TEXT: &str = "No users yet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    /// Also the row key.
    pub id: String,
    pub name: String,
    pub caption: String,
}

/// What the list shows: one row per user, or a single placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserList {
    pub rows: Vec<UserRow>,
    pub placeholder: Option<&'static str>,
}

impl UserList {
    pub fn from_users(users: &[User]) -> Self {
        let rows: Vec<UserRow> = users
            .iter()
            .map(|u| UserRow {
                id: u.id.to_string(),
                name: u.name.clone(),
                caption: u.caption(),
            })
            .collect();
        let placeholder = rows.is_empty().then_some(EMPTY_LIST_TEXT);
        Self { rows, placeholder }
    }
}

pub struct RoleOption {
    pub value: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersPage {
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleOption>,
    pub editing: bool,
    pub submitting: bool,
    pub list: UserList,
    pub load_error: Option<String>,
    pub submit_error: Option<String>,
    pub delete_error: Option<DeleteFailure>,
}

impl UsersPage {
    pub fn from_state(state: &ScreenState) -> Self {
        let roles = Role::ALL
            .into_iter()
            .map(|role| RoleOption {
                value: role.as_str(),
                selected: role == state.draft.role,
            })
            .collect();

        Self {
            name: state.draft.name.clone(),
            email: state.draft.email.clone(),
            roles,
            editing: state.editing.is_some(),
            submitting: state.submitting,
            list: UserList::from_users(&state.users),
            load_error: state.load_error.clone(),
            submit_error: state.submit_error.clone(),
            delete_error: state.delete_error.clone(),
        }
    }
}
