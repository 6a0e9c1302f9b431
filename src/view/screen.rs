use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::client::UserApi;
use crate::client::models::{Role, User, UserId, UserInput};

/// Form fields for the next user to be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Draft {
    /// Both name and email carry something besides whitespace.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }

    fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    fn to_input(&self) -> UserInput {
        UserInput {
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub id: UserId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenState {
    pub draft: Draft,
    /// Result of the latest applied full fetch.
    pub users: Vec<User>,
    /// Target of an in-progress edit; submit updates it instead of creating.
    pub editing: Option<UserId>,
    pub submitting: bool,
    pub loaded: bool,
    pub load_error: Option<String>,
    pub submit_error: Option<String>,
    pub delete_error: Option<DeleteFailure>,
    pub(crate) applied_reload: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved,
    /// Name or email is blank; nothing was sent.
    Incomplete,
    /// Another submission has not finished yet.
    InFlight,
    Failed,
}

/// The user management screen: form draft, user list and the reload loop
/// that keeps the list in step with the user service.
///
/// Every mutation is followed by a full reload; the list is never patched
/// locally. The state lock is never held across a service call.
pub struct UserScreen {
    api: Arc<dyn UserApi>,
    state: Mutex<ScreenState>,
    mounted: OnceCell<()>,
    reload_seq: AtomicU64,
}

impl UserScreen {
    pub fn new(api: Arc<dyn UserApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ScreenState::default()),
            mounted: OnceCell::new(),
            reload_seq: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScreenState> {
        // handlers never panic while holding the lock; recover the data if one did
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ScreenState {
        self.state().clone()
    }

    /// Initial load. Only the first call that runs to completion loads;
    /// callers arriving meanwhile wait for it, and a cancelled load leaves
    /// the screen unmounted.
    pub async fn mount(&self) -> bool {
        let mut loaded_here = false;
        let flag = &mut loaded_here;
        self.mounted
            .get_or_init(move || async move {
                debug!("mounting user screen");
                self.reload().await;
                *flag = true;
            })
            .await;
        loaded_here
    }

    /// Replaces the list with a fresh full fetch.
    ///
    /// A fetch that resolves after a later one has already been applied is
    /// dropped, so the list always reflects the newest request.
    pub async fn reload(&self) {
        let seq = self.reload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.api.list_users().await;

        let mut state = self.state();
        if seq < state.applied_reload {
            debug!(seq, applied = state.applied_reload, "dropping stale user list");
            return;
        }
        state.applied_reload = seq;

        match result {
            Ok(users) => {
                state.users = users.unwrap_or_default();
                state.loaded = true;
                state.load_error = None;
            }
            Err(e) => {
                warn!(error = %e, "failed to load users");
                state.load_error = Some(e.to_string());
            }
        }
    }

    pub fn update_draft(&self, draft: Draft) {
        self.state().draft = draft;
    }

    /// Saves the draft: creates a user, or updates the one being edited.
    pub async fn submit(&self) -> SubmitOutcome {
        let (input, editing) = {
            let mut state = self.state();
            if state.submitting {
                debug!("submission already in flight");
                return SubmitOutcome::InFlight;
            }
            if !state.draft.is_complete() {
                debug!("ignoring submit with blank name or email");
                return SubmitOutcome::Incomplete;
            }
            state.submitting = true;
            state.submit_error = None;
            (state.draft.to_input(), state.editing.clone())
        };
        let in_flight = SubmitGuard {
            screen: self,
            finished: false,
        };

        let result = match &editing {
            Some(id) => {
                info!(%id, name = %input.name, "updating user");
                self.api.update_user(id, input).await
            }
            None => {
                info!(name = %input.name, role = %input.role, "creating user");
                self.api.create_user(input).await
            }
        };

        {
            let mut state = self.state();
            in_flight.finish(&mut state);
            if let Err(e) = result {
                warn!(error = %e, "failed to save user");
                state.submit_error = Some(e.to_string());
                return SubmitOutcome::Failed;
            }
            state.draft = Draft::default();
            state.editing = None;
        }

        self.reload().await;
        SubmitOutcome::Saved
    }

    pub async fn delete(&self, id: &UserId) -> bool {
        info!(%id, "deleting user");
        if let Err(e) = self.api.delete_user(id).await {
            warn!(%id, error = %e, "failed to delete user");
            self.state().delete_error = Some(DeleteFailure {
                id: id.clone(),
                message: e.to_string(),
            });
            return false;
        }

        self.state().delete_error = None;
        self.reload().await;
        true
    }

    /// Loads the selected user into the draft so the next submit updates it.
    pub fn begin_edit(&self, id: &UserId) -> bool {
        let mut state = self.state();
        let Some(user) = state.users.iter().find(|u| &u.id == id) else {
            debug!(%id, "edit requested for a user not in the list");
            return false;
        };
        let draft = Draft::from_user(user);
        state.draft = draft;
        state.editing = Some(id.clone());
        state.submit_error = None;
        true
    }

    pub fn cancel_edit(&self) {
        let mut state = self.state();
        state.draft = Draft::default();
        state.editing = None;
        state.submit_error = None;
    }
}

/// Clears `submitting` if a submit is dropped before its save resolves.
struct SubmitGuard<'a> {
    screen: &'a UserScreen,
    finished: bool,
}

impl SubmitGuard<'_> {
    /// Clears the flag under a lock the caller already holds.
    fn finish(mut self, state: &mut ScreenState) {
        state.submitting = false;
        self.finished = true;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("submission cancelled before the service answered");
            self.screen.state().submitting = false;
        }
    }
}
