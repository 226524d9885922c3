//! Integration tests for the session state machine over a mock backend.

use std::sync::Arc;

use khetsetu_core::api::{
    ApiClient, Credentials, PasswordChange, ProfileUpdate, TokenPair, TokenStore,
};
use khetsetu_core::auth::SessionManager;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_response() -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "data": {
            "user": {
                "id": "u-1",
                "name": "Demo Farmer",
                "email": "demo@khetsetu.com",
                "phone": "9876500000",
                "role": "farmer",
                "profile": {
                    "village": "Rampur",
                    "district": "Sitapur",
                    "state": "Uttar Pradesh",
                    "landSizeAcres": 2.5,
                    "primaryCrops": ["wheat", "mustard"]
                }
            },
            "token": "A",
            "refreshToken": "R"
        },
        "message": "Login successful"
    })
}

fn profile_response(name: &str) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "data": {
            "user": {
                "id": "u-1",
                "name": name,
                "email": "demo@khetsetu.com",
                "role": "farmer"
            }
        }
    })
}

fn session_at(dir: &tempfile::TempDir, base_url: &str, seed: Option<(&str, &str)>) -> SessionManager {
    let mut store = TokenStore::open(dir.path().join("session.json")).unwrap();
    if let Some((access, refresh)) = seed {
        store
            .set(TokenPair {
                access: access.to_string(),
                refresh: refresh.to_string(),
            })
            .unwrap();
    }
    SessionManager::new(Arc::new(ApiClient::new(base_url, store)))
}

/// Test: the login example scenario lands in authenticated state with the
/// pair persisted.
#[tokio::test]
async fn test_login_success_state_and_storage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_response()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), None);

    let user = session
        .login(&Credentials {
            email: "demo@khetsetu.com".to_string(),
            password: "demo123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.name, "Demo Farmer");

    let state = session.state();
    assert!(state.is_authenticated);
    assert_eq!(state.user.as_ref().unwrap().email, "demo@khetsetu.com");
    assert!(!state.loading);
    assert!(state.error.is_none());

    let raw = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["authToken"], "A");
    assert_eq!(stored["refreshToken"], "R");
}

/// Test: a rejected login surfaces the server message and also re-throws.
#[tokio::test]
async fn test_login_failure_sets_error_and_rethrows() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({ "success": false, "message": "Invalid credentials" }),
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), None);

    let err = session
        .login(&Credentials {
            email: "demo@khetsetu.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");

    let state = session.state();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
}

/// Test: logout returns to anonymous even when the server rejects the call.
#[tokio::test]
async fn test_logout_always_clears_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response("Demo Farmer")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), Some(("A", "R")));

    session.check_auth().await;
    assert!(session.state().is_authenticated);

    session.logout().await;

    let state = session.state();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(state.error.is_none());
    assert!(!session.client().is_authenticated());
    assert!(!dir.path().join("session.json").exists());
}

/// Test: check_auth with no stored token makes no request and stays initial.
#[tokio::test]
async fn test_check_auth_without_token_is_noop() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), None);

    session.check_auth().await;

    assert_eq!(*session.state(), khetsetu_core::auth::AuthState::new());
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Test: check_auth with a rejected token demotes silently — anonymous,
/// no error banner, tokens gone.
#[tokio::test]
async fn test_check_auth_invalid_token_demotes_silently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({ "success": false, "message": "Invalid token" }),
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({ "success": false, "message": "Invalid refresh token" }),
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), Some(("A", "R")));

    session.check_auth().await;

    let state = session.state();
    assert!(!state.is_authenticated);
    assert!(state.error.is_none());
    assert!(!state.loading);
    assert!(!session.client().is_authenticated());
    assert!(!dir.path().join("session.json").exists());
}

/// Test: check_auth with a valid token restores the authenticated state.
#[tokio::test]
async fn test_check_auth_restores_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .and(header("Authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response("Demo Farmer")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), Some(("A", "R")));

    session.check_auth().await;

    let state = session.state();
    assert!(state.is_authenticated);
    assert_eq!(state.user.as_ref().unwrap().name, "Demo Farmer");
}

/// Test: a profile update swaps the cached user without touching the flags.
#[tokio::test]
async fn test_update_profile_swaps_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response("Demo Farmer")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/auth/profile"))
        .and(body_partial_json(serde_json::json!({ "name": "Renamed Farmer" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response("Renamed Farmer")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), Some(("A", "R")));
    session.check_auth().await;

    let update = ProfileUpdate {
        name: Some("Renamed Farmer".to_string()),
        ..ProfileUpdate::default()
    };
    let user = session.update_profile(&update).await.unwrap();
    assert_eq!(user.name, "Renamed Farmer");

    let state = session.state();
    assert!(state.is_authenticated);
    assert!(!state.loading);
    assert_eq!(state.user.as_ref().unwrap().name, "Renamed Farmer");
}

/// Test: a failed profile update propagates without disturbing state.
#[tokio::test]
async fn test_update_profile_failure_keeps_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response("Demo Farmer")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            serde_json::json!({ "success": false, "message": "Phone number already in use" }),
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), Some(("A", "R")));
    session.check_auth().await;

    let err = session
        .update_profile(&ProfileUpdate {
            phone: Some("123".to_string()),
            ..ProfileUpdate::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Phone number already in use");

    let state = session.state();
    assert!(state.is_authenticated);
    assert!(state.error.is_none());
    assert_eq!(state.user.as_ref().unwrap().name, "Demo Farmer");
}

/// Test: change_password succeeds without mutating session state.
#[tokio::test]
async fn test_change_password_keeps_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response("Demo Farmer")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/change-password"))
        .and(body_partial_json(serde_json::json!({
            "currentPassword": "Old123",
            "newPassword": "New123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "success": true, "message": "Password updated" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session_at(&dir, &server.uri(), Some(("A", "R")));
    session.check_auth().await;
    let before = session.state().clone();

    session
        .change_password(&PasswordChange {
            current_password: "Old123".to_string(),
            new_password: "New123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(*session.state(), before);
    assert!(session.client().is_authenticated());
}
