//! Session store: single source of truth for "who is logged in".

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError, FilePart};
use crate::events::{EventBus, StoreEvent};
use crate::types::{Credentials, Page, ProfilePatch, RegisterPayload, User, UserAdminPatch};
use inkbound_core::UserId;

use super::{read_lock, write_lock};

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    is_loading: bool,
    error: Option<String>,
    all_users: Option<Page<User>>,
    is_fetching_users: bool,
}

#[derive(Deserialize)]
struct AuthBody {
    user: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPageBody {
    users: Vec<User>,
    total_users: u64,
    total_pages: u32,
    current_page: u32,
}

impl From<UserPageBody> for Page<User> {
    fn from(body: UserPageBody) -> Self {
        Self {
            items: body.users,
            total: body.total_users,
            total_pages: body.total_pages,
            current_page: body.current_page,
        }
    }
}

/// Owns the authenticated-user identity and session lifecycle, plus the
/// admin-side paginated user list.
///
/// Overlapping auth calls share one loading flag and race on it; callers
/// are expected not to run login and register concurrently.
pub struct SessionStore {
    api: ApiClient,
    events: EventBus,
    state: RwLock<SessionState>,
    probed: AtomicBool,
}

impl SessionStore {
    pub(crate) fn new(api: ApiClient, events: EventBus) -> Self {
        Self {
            api,
            events,
            state: RwLock::new(SessionState {
                // Loading until the session probe settles.
                is_loading: true,
                ..SessionState::default()
            }),
            probed: AtomicBool::new(false),
        }
    }

    /// Probe the server for an existing session.
    ///
    /// Runs at most once per process, no matter how many views call it;
    /// later calls return the cached identity. A rejection is the normal
    /// answer for an anonymous visitor and records no error.
    #[instrument(skip(self))]
    pub async fn check_session(&self) -> Option<User> {
        if self.probed.swap(true, Ordering::SeqCst) {
            return self.current_user();
        }

        debug!("checking for active session");
        let result = self.api.get::<AuthBody>("/auth/me").await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.user = Some(body.user.clone());
                drop(state);
                debug!("session found, user is logged in");
                self.events.publish(StoreEvent::SessionStarted);
                Some(body.user)
            }
            Err(err) => {
                debug!(error = %err, "no active session");
                state.user = None;
                None
            }
        }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so the login form can react; the message
    /// is also recorded in the store's error slot.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: Credentials) -> Result<User, ApiError> {
        self.begin(|state| &mut state.is_loading);
        let result = self.api.post::<AuthBody, _>("/auth/login", &credentials).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.user = Some(body.user.clone());
                drop(state);
                self.events.publish(StoreEvent::SessionStarted);
                Ok(body.user)
            }
            Err(err) => {
                state.error =
                    Some(err.message_or("Login failed. Please check your credentials."));
                Err(err)
            }
        }
    }

    /// Register a new account and log it in.
    ///
    /// The password/confirmation mismatch is caught here, before any
    /// request is made; `confirm_password` never reaches the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on mismatch, otherwise the
    /// server's rejection.
    #[instrument(skip(self, payload))]
    pub async fn register(&self, payload: RegisterPayload) -> Result<User, ApiError> {
        if payload.password != payload.confirm_password {
            let message = "Passwords do not match. Please try again.".to_owned();
            write_lock(&self.state).error = Some(message.clone());
            return Err(ApiError::Validation(message));
        }

        self.begin(|state| &mut state.is_loading);
        let result = self.api.post::<AuthBody, _>("/auth/register", &payload).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.user = Some(body.user.clone());
                drop(state);
                self.events.publish(StoreEvent::SessionStarted);
                Ok(body.user)
            }
            Err(err) => {
                state.error = Some(err.message_or("Registration failed. Please try again."));
                Err(err)
            }
        }
    }

    /// Log out.
    ///
    /// Local state is cleared unconditionally: even when the server call
    /// fails, this process must not stay authenticated.
    ///
    /// # Errors
    ///
    /// Propagates the server rejection after clearing local state.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.begin(|state| &mut state.is_loading);
        let result = self.api.post_empty::<()>("/auth/logout").await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        state.user = None;
        if let Err(err) = &result {
            warn!(error = %err, "logout rejected by server, clearing session anyway");
            state.error = Some(err.message_or("Logout failed."));
        }
        drop(state);
        self.events.publish(StoreEvent::SessionEnded);
        result
    }

    /// Update the authenticated user's name fields.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the message is recorded for the form.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<User, ApiError> {
        self.begin(|state| &mut state.is_loading);
        let result = self.api.put::<AuthBody, _>("/auth/me", &patch).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.user = Some(body.user.clone());
                Ok(body.user)
            }
            Err(err) => {
                state.error = Some(err.message_or("Profile update failed."));
                Err(err)
            }
        }
    }

    /// Upload a new avatar image.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the message is recorded for the form.
    #[instrument(skip(self, file))]
    pub async fn upload_avatar(&self, file: FilePart) -> Result<User, ApiError> {
        self.begin(|state| &mut state.is_loading);
        let result = self.api.upload::<AuthBody>("/auth/avatar", vec![file]).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.user = Some(body.user.clone());
                Ok(body.user)
            }
            Err(err) => {
                state.error = Some(err.message_or("Avatar upload failed. Please try again."));
                Err(err)
            }
        }
    }

    /// Fetch a page of all users (admin only). Replaces the cached page
    /// wholesale.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; list views render the recorded message.
    #[instrument(skip(self))]
    pub async fn fetch_all_users(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<(), ApiError> {
        self.begin(|state| &mut state.is_fetching_users);

        let mut query = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let result = self
            .api
            .get_query::<UserPageBody>("/auth/admin/users", &query)
            .await;

        let mut state = write_lock(&self.state);
        state.is_fetching_users = false;
        match result {
            Ok(body) => {
                state.all_users = Some(body.into());
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to fetch users."));
                Err(err)
            }
        }
    }

    /// Toggle another user's flags (admin only).
    ///
    /// Patches exactly the one changed row of the cached page instead of
    /// refetching it.
    ///
    /// # Errors
    ///
    /// Propagates the rejection untouched; the caller owns the feedback.
    #[instrument(skip(self, patch), fields(user_id = %user_id))]
    pub async fn update_user_as_admin(
        &self,
        user_id: UserId,
        patch: UserAdminPatch,
    ) -> Result<User, ApiError> {
        let body = self
            .api
            .put::<AuthBody, _>(&format!("/auth/admin/users/{user_id}"), &patch)
            .await?;

        let mut state = write_lock(&self.state);
        if let Some(page) = &mut state.all_users {
            for row in &mut page.items {
                if row.id == user_id {
                    *row = body.user.clone();
                }
            }
        }
        Ok(body.user)
    }

    fn begin(&self, flag: impl FnOnce(&mut SessionState) -> &mut bool) {
        let mut state = write_lock(&self.state);
        *flag(&mut state) = true;
        state.error = None;
    }

    // Getters

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        read_lock(&self.state).user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        read_lock(&self.state).user.is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        read_lock(&self.state).is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        read_lock(&self.state).error.clone()
    }

    #[must_use]
    pub fn all_users(&self) -> Option<Page<User>> {
        read_lock(&self.state).all_users.clone()
    }

    #[must_use]
    pub fn is_fetching_users(&self) -> bool {
        read_lock(&self.state).is_fetching_users
    }

    pub fn clear_error(&self) {
        write_lock(&self.state).error = None;
    }
}
