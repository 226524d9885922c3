//! Session operations.
//!
//! [`SessionManager`] wraps the API client's auth calls and reduces their
//! outcomes into [`AuthState`], so the surface layer always observes the
//! latest known authentication result.

use std::sync::Arc;

use anyhow::Result;

use super::state::{reduce, AuthAction, AuthState};
use crate::api::{
    ApiClient, Credentials, PasswordChange, ProfileUpdate, Registration, User,
};

const LOGIN_FALLBACK: &str = "Login failed";
const REGISTER_FALLBACK: &str = "Registration failed";
const PROFILE_FALLBACK: &str = "Profile update failed";
const PASSWORD_FALLBACK: &str = "Password change failed";

/// Owns the auth state and the only dispatch path into its reducer.
pub struct SessionManager {
    client: Arc<ApiClient>,
    state: AuthState,
}

impl SessionManager {
    /// Creates a manager over an explicitly constructed client.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            state: AuthState::new(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// The underlying client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn dispatch(&mut self, action: AuthAction) {
        reduce(&mut self.state, action);
    }

    /// Authenticates and caches the resulting user.
    ///
    /// A failure both lands in the state (for global consumers) and is
    /// returned (so form-level code can react without losing its inputs).
    ///
    /// # Errors
    /// Returns an error when the backend rejects the credentials or the
    /// request fails.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<User> {
        self.dispatch(AuthAction::Start);

        match self.client.login(credentials).await {
            Ok(envelope) => {
                if envelope.success {
                    if let Some(data) = envelope.data {
                        self.dispatch(AuthAction::Success(data.user.clone()));
                        return Ok(data.user);
                    }
                }
                let message = envelope.error_message(LOGIN_FALLBACK);
                self.dispatch(AuthAction::Failure(message.clone()));
                Err(anyhow::anyhow!(message))
            }
            Err(e) => {
                self.dispatch(AuthAction::Failure(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Creates an account. Same contract shape as [`SessionManager::login`].
    ///
    /// # Errors
    /// Returns an error when the backend rejects the registration or the
    /// request fails.
    pub async fn register(&mut self, registration: &Registration) -> Result<User> {
        self.dispatch(AuthAction::Start);

        match self.client.register(registration).await {
            Ok(envelope) => {
                if envelope.success {
                    if let Some(data) = envelope.data {
                        self.dispatch(AuthAction::Success(data.user.clone()));
                        return Ok(data.user);
                    }
                }
                let message = envelope.error_message(REGISTER_FALLBACK);
                self.dispatch(AuthAction::Failure(message.clone()));
                Err(anyhow::anyhow!(message))
            }
            Err(e) => {
                self.dispatch(AuthAction::Failure(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Ends the session.
    ///
    /// The server call is best-effort: any failure is logged and swallowed,
    /// and the state returns to anonymous unconditionally.
    pub async fn logout(&mut self) {
        if let Err(e) = self.client.logout().await {
            tracing::warn!(error = %e, "server logout failed, clearing locally");
        }
        self.dispatch(AuthAction::Logout);
    }

    /// Updates the profile and swaps the cached user on success.
    ///
    /// Not a session-level operation: a failure propagates to the caller
    /// without touching the auth flags or surfacing a global error.
    ///
    /// # Errors
    /// Returns an error when the backend rejects the update or the request
    /// fails.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<User> {
        let envelope = self.client.update_profile(update).await?;

        if envelope.success {
            if let Some(data) = envelope.data {
                self.dispatch(AuthAction::UpdateUser(data.user.clone()));
                return Ok(data.user);
            }
        }
        Err(anyhow::anyhow!(envelope.error_message(PROFILE_FALLBACK)))
    }

    /// Changes the password. Tokens stay valid, state stays untouched.
    ///
    /// # Errors
    /// Returns an error when the backend rejects the change or the request
    /// fails.
    pub async fn change_password(&mut self, change: &PasswordChange) -> Result<()> {
        let envelope = self.client.change_password(change).await?;

        if envelope.success {
            return Ok(());
        }
        Err(anyhow::anyhow!(envelope.error_message(PASSWORD_FALLBACK)))
    }

    /// Bootstrap reconciliation, run once before the surface reads state.
    ///
    /// With no stored token this is a no-op — a fresh client stays anonymous
    /// without a network call. A stored token the backend rejects demotes
    /// silently to anonymous: an invalid session is "never logged in", not
    /// an error to surface.
    pub async fn check_auth(&mut self) {
        if !self.client.is_authenticated() {
            return;
        }

        self.dispatch(AuthAction::Start);

        match self.client.profile().await {
            Ok(envelope) => {
                if envelope.success {
                    if let Some(data) = envelope.data {
                        self.dispatch(AuthAction::Success(data.user));
                        return;
                    }
                }
                tracing::debug!("stored session rejected, demoting to anonymous");
                self.client.clear_tokens();
                self.dispatch(AuthAction::Logout);
            }
            Err(e) => {
                tracing::debug!(error = %e, "auth check failed, demoting to anonymous");
                self.client.clear_tokens();
                self.dispatch(AuthAction::Logout);
            }
        }
    }

    /// Drops the visible error.
    pub fn clear_error(&mut self) {
        self.dispatch(AuthAction::ClearError);
    }
}
