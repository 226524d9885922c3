//! Auth state reducer (update function).
//!
//! All session-state mutations happen here. Operations dispatch an
//! [`AuthAction`] and the reducer applies it; nothing else writes the state.
//!
//! Invariant: `is_authenticated` is true iff `user` is present — both flip
//! together in every transition below.

use crate::api::User;

/// Global authentication state observed by the UI layer.
///
/// `loading` is true only during an in-flight start/check transition.
/// `error` survives until a successful transition or an explicit clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// The initial anonymous state.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Actions accepted by the reducer.
#[derive(Debug, Clone)]
pub enum AuthAction {
    /// A session-establishing operation started (login, register, check).
    Start,
    /// A session-establishing operation produced an authenticated user.
    Success(User),
    /// A session-establishing operation failed with a displayable message.
    Failure(String),
    /// Reset to the initial anonymous state.
    Logout,
    /// Drop the visible error, leaving everything else untouched.
    ClearError,
    /// Replace the cached user without disturbing the session flags.
    UpdateUser(User),
}

/// The reducer. Applies one action to the state.
pub fn reduce(state: &mut AuthState, action: AuthAction) {
    match action {
        AuthAction::Start => {
            state.loading = true;
            state.error = None;
        }
        AuthAction::Success(user) => {
            state.is_authenticated = true;
            state.user = Some(user);
            state.loading = false;
            state.error = None;
        }
        AuthAction::Failure(message) => {
            state.is_authenticated = false;
            state.user = None;
            state.loading = false;
            state.error = Some(message);
        }
        AuthAction::Logout => {
            *state = AuthState::new();
        }
        AuthAction::ClearError => {
            state.error = None;
        }
        AuthAction::UpdateUser(user) => {
            state.user = Some(user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "name": "Demo Farmer",
            "email": "demo@khetsetu.com",
            "role": "farmer"
        }))
        .unwrap()
    }

    /// Test: start sets loading and clears a stale error.
    #[test]
    fn test_start_clears_error() {
        let mut state = AuthState {
            error: Some("old failure".to_string()),
            ..AuthState::new()
        };

        reduce(&mut state, AuthAction::Start);
        assert!(state.loading);
        assert!(state.error.is_none());
        assert!(!state.is_authenticated);
    }

    /// Test: success terminates loading and upholds the user invariant.
    #[test]
    fn test_success_transition() {
        let mut state = AuthState::new();
        reduce(&mut state, AuthAction::Start);
        reduce(&mut state, AuthAction::Success(demo_user()));

        assert!(state.is_authenticated);
        assert_eq!(state.is_authenticated, state.user.is_some());
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    /// Test: failure demotes to anonymous with the message attached.
    #[test]
    fn test_failure_transition() {
        let mut state = AuthState::new();
        reduce(&mut state, AuthAction::Start);
        reduce(&mut state, AuthAction::Success(demo_user()));
        reduce(&mut state, AuthAction::Start);
        reduce(&mut state, AuthAction::Failure("Invalid credentials".to_string()));

        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
    }

    /// Test: logout resets everything, including a visible error.
    #[test]
    fn test_logout_resets() {
        let mut state = AuthState::new();
        reduce(&mut state, AuthAction::Success(demo_user()));
        reduce(&mut state, AuthAction::Failure("boom".to_string()));
        reduce(&mut state, AuthAction::Logout);

        assert_eq!(state, AuthState::new());
    }

    /// Test: clear_error is idempotent.
    #[test]
    fn test_clear_error_idempotent() {
        let mut state = AuthState::new();
        reduce(&mut state, AuthAction::Success(demo_user()));
        let before = state.clone();

        reduce(&mut state, AuthAction::ClearError);
        assert_eq!(state, before);

        state.error = Some("visible".to_string());
        reduce(&mut state, AuthAction::ClearError);
        reduce(&mut state, AuthAction::ClearError);
        assert!(state.error.is_none());
        assert!(state.is_authenticated);
    }

    /// Test: update_user swaps the cached record without touching flags.
    #[test]
    fn test_update_user_keeps_flags() {
        let mut state = AuthState::new();
        reduce(&mut state, AuthAction::Success(demo_user()));

        let mut renamed = demo_user();
        renamed.name = "Renamed Farmer".to_string();
        reduce(&mut state, AuthAction::UpdateUser(renamed));

        assert!(state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.user.as_ref().unwrap().name, "Renamed Farmer");
    }
}
