use crate::{
    api::ApiClient,
    dto::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
    errors::{ActionError, ClientError, report},
    messages::{Locale, Operation},
    models::UserProfile,
    storage::{Storage, TOKEN_KEY, USER_INFO_KEY},
    sync,
};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use validator::Validate;

/// Token and profile of the signed-in user. Both are set or both are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

/// Holds the session. Every change to the in-memory session, the durable
/// records and the request credential happens under the session write lock.
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    locale: Locale,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Restores the session persisted in `storage` and re-attaches its token
    /// to the client. A half-written session (token without profile, or an
    /// unreadable profile) is discarded. When storage itself cannot be read
    /// the records are left in place and the store starts signed out.
    pub fn restore(api: ApiClient, storage: Arc<dyn Storage>, locale: Locale) -> Self {
        let session = match load_session(storage.as_ref()) {
            Ok(session) => session,
            Err(err @ ClientError::Storage(_)) => {
                warn!(error = %err, "stored session unavailable, starting signed out");
                Session::default()
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable stored session");
                clear_records(storage.as_ref());
                Session::default()
            }
        };

        match &session.token {
            Some(token) => {
                api.set_bearer(token);
                info!("restored stored session");
            }
            None => api.clear_bearer(),
        }

        Self {
            api,
            storage,
            locale,
            state: RwLock::new(session),
        }
    }

    fn fail(&self, op: Operation, err: &ClientError) -> ActionError {
        report(op.name(), err, op.default_message(self.locale))
    }

    /// Persists both records, then publishes the session and its credential.
    fn establish(&self, auth: AuthResponse) -> Result<UserProfile, ClientError> {
        let AuthResponse { token, user } = auth;
        let encoded = serde_json::to_string(&user)?;

        let mut state = sync::write(&self.state);
        self.storage.set(TOKEN_KEY, &token)?;
        if let Err(err) = self.storage.set(USER_INFO_KEY, &encoded) {
            self.end(&mut state);
            return Err(err);
        }

        self.api.set_bearer(&token);
        *state = Session {
            token: Some(token),
            user: Some(user.clone()),
        };
        Ok(user)
    }

    /// Stores `user` as the profile of the session whose token sent the
    /// request. Returns `false` and changes nothing once that session has
    /// ended or been replaced.
    fn replace_user(&self, user: &UserProfile, sent_with: Option<&str>) -> Result<bool, ClientError> {
        let encoded = serde_json::to_string(user)?;

        let mut state = sync::write(&self.state);
        if sent_with.is_none() || state.token.as_deref() != sent_with {
            return Ok(false);
        }
        self.storage.set(USER_INFO_KEY, &encoded)?;
        state.user = Some(user.clone());
        Ok(true)
    }

    /// Drops the session, both durable records and the request credential.
    fn end(&self, state: &mut Session) {
        *state = Session::default();
        clear_records(self.storage.as_ref());
        self.api.clear_bearer();
    }

    pub async fn login(&self, credentials: LoginRequest) -> Result<UserProfile, ActionError> {
        let result = async {
            credentials.validate()?;
            let auth = self.api.login(&credentials).await?;
            self.establish(auth)
        };

        match result.await {
            Ok(user) => {
                info!(username = %user.username, "logged in");
                Ok(user)
            }
            Err(err) => Err(self.fail(Operation::Login, &err)),
        }
    }

    pub async fn register(&self, payload: RegisterRequest) -> Result<UserProfile, ActionError> {
        let result = async {
            payload.validate()?;
            let auth = self.api.register(&payload).await?;
            self.establish(auth)
        };

        match result.await {
            Ok(user) => {
                info!(username = %user.username, "registered");
                Ok(user)
            }
            Err(err) => Err(self.fail(Operation::Register, &err)),
        }
    }

    /// Refreshes the profile. `Ok(None)` without a token, or when the
    /// session changed while the request was in flight. A 401 ends the
    /// session that sent the request.
    pub async fn fetch_user_info(&self) -> Result<Option<UserProfile>, ActionError> {
        let Some(sent_with) = self.token() else {
            return Ok(None);
        };

        let result = async {
            let user = self.api.current_user().await?;
            let applied = self.replace_user(&user, Some(sent_with.as_str()))?;
            Ok::<_, ClientError>(applied.then_some(user))
        };

        match result.await {
            Ok(Some(user)) => Ok(Some(user)),
            Ok(None) => {
                debug!("session changed during profile fetch, dropping response");
                Ok(None)
            }
            Err(err) => {
                if err.is_unauthorized() && self.logout_if_current(&sent_with) {
                    warn!("stored token rejected, logged out");
                }
                Err(self.fail(Operation::FetchUserInfo, &err))
            }
        }
    }

    /// Sends the profile changes. The returned profile is only held and
    /// stored if the session that sent it is still the current one.
    pub async fn update_profile(
        &self,
        payload: UpdateProfileRequest,
    ) -> Result<UserProfile, ActionError> {
        let sent_with = self.token();
        let result = async {
            payload.validate()?;
            let user = self.api.update_profile(&payload).await?;
            let applied = self.replace_user(&user, sent_with.as_deref())?;
            Ok::<_, ClientError>((user, applied))
        };

        match result.await {
            Ok((user, true)) => {
                info!(username = %user.username, "profile updated");
                Ok(user)
            }
            Ok((user, false)) => {
                debug!(username = %user.username, "profile updated after session changed, not applied");
                Ok(user)
            }
            Err(err) => Err(self.fail(Operation::UpdateProfile, &err)),
        }
    }

    pub async fn change_password(&self, payload: ChangePasswordRequest) -> Result<(), ActionError> {
        let result = async {
            payload.validate()?;
            self.api.change_password(&payload).await
        };

        match result.await {
            Ok(()) => {
                info!("password changed");
                Ok(())
            }
            Err(err) => Err(self.fail(Operation::ChangePassword, &err)),
        }
    }

    /// Clears the session, both durable records and the request credential.
    pub fn logout(&self) {
        let mut state = sync::write(&self.state);
        self.end(&mut state);
        info!("logged out");
    }

    /// Logs out only if `token` is still the held credential.
    fn logout_if_current(&self, token: &str) -> bool {
        let mut state = sync::write(&self.state);
        if state.token.as_deref() != Some(token) {
            return false;
        }
        self.end(&mut state);
        true
    }

    pub fn session(&self) -> Session {
        sync::read(&self.state).clone()
    }

    pub fn token(&self) -> Option<String> {
        sync::read(&self.state).token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        sync::read(&self.state).user.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        sync::read(&self.state).token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        sync::read(&self.state)
            .user
            .as_ref()
            .is_some_and(UserProfile::is_admin)
    }

    /// `"first last"`, or empty when signed out.
    pub fn user_full_name(&self) -> String {
        sync::read(&self.state)
            .user
            .as_ref()
            .map(UserProfile::full_name)
            .unwrap_or_default()
    }
}

fn load_session(storage: &dyn Storage) -> Result<Session, ClientError> {
    let token = storage.get(TOKEN_KEY)?;
    let user = storage
        .get(USER_INFO_KEY)?
        .map(|raw| serde_json::from_str::<UserProfile>(&raw))
        .transpose()?;

    match (token, user) {
        (Some(token), Some(user)) => Ok(Session {
            token: Some(token),
            user: Some(user),
        }),
        (None, None) => Ok(Session::default()),
        (Some(_), None) => Err(ClientError::IncompleteSession {
            missing: USER_INFO_KEY,
        }),
        (None, Some(_)) => Err(ClientError::IncompleteSession { missing: TOKEN_KEY }),
    }
}

fn clear_records(storage: &dyn Storage) {
    for key in [TOKEN_KEY, USER_INFO_KEY] {
        if let Err(err) = storage.remove(key) {
            warn!(key, error = %err, "failed to remove stored record");
        }
    }
}
