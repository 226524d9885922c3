//! HTTP client for the KhetSetu backend.
//!
//! Owns the token pair and performs the refresh-then-retry protocol on 401:
//! at most one refresh and one retried request per failing call. Concurrent
//! 401s share a single refresh through an async gate.

use std::sync::Mutex;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::tokens::{TokenPair, TokenStore};
use super::types::{
    ApiEnvelope, AuthData, Credentials, PasswordChange, ProfileData, ProfileUpdate, Registration,
    TokenData,
};
use crate::config::DEFAULT_API_URL;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const REFRESH_PATH: &str = "/auth/refresh-token";
const PROFILE_PATH: &str = "/auth/profile";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";

/// API client for the KhetSetu backend.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    /// Token pair guarded for short, await-free critical sections.
    tokens: Mutex<TokenStore>,
    /// Single-flight gate: concurrent 401s line up here so only the first
    /// caller performs the refresh; the rest retry with the token it stored.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    /// Creates a new client with the given base URL and token store.
    ///
    /// # Panics
    /// - In test builds (`#[cfg(test)]`), panics if `base_url` is the default
    ///   backend.
    /// - At runtime, panics if `KHETSETU_BLOCK_REAL_API=1` and `base_url` is
    ///   the default backend.
    ///
    /// This prevents tests from accidentally making real network requests.
    /// Use `KHETSETU_API_URL` or config to point to a mock server.
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        let base_url = base_url.into();

        #[cfg(test)]
        assert!(
            base_url != DEFAULT_API_URL,
            "Tests must not use a real KhetSetu backend!\n\
             Set KHETSETU_API_URL to a mock server (e.g., wiremock).\n\
             Found base_url: {base_url}",
        );

        #[cfg(not(test))]
        if std::env::var("KHETSETU_BLOCK_REAL_API").is_ok_and(|v| v == "1") {
            assert!(
                base_url != DEFAULT_API_URL,
                "KHETSETU_BLOCK_REAL_API=1 but trying to use a real backend!\n\
                 Set KHETSETU_API_URL to a mock server.\n\
                 Found base_url: {base_url}",
            );
        }

        Self {
            base_url,
            http: reqwest::Client::new(),
            tokens: Mutex::new(tokens),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the held access token, if any. In-memory read.
    pub fn access_token(&self) -> Option<String> {
        self.lock_tokens().access_token().map(str::to_string)
    }

    /// Returns true if an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.lock_tokens().is_authenticated()
    }

    /// Clears the held pair and its persisted copy.
    /// A persistence failure is logged, never surfaced.
    pub fn clear_tokens(&self) {
        if let Err(e) = self.lock_tokens().clear() {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
    }

    /// Authenticates with email/password credentials.
    ///
    /// On a successful envelope carrying a token pair, the pair is stored
    /// before this returns, so `access_token()` reflects it immediately.
    ///
    /// # Errors
    /// Returns an error on transport failure or an undecodable body.
    pub async fn login(&self, credentials: &Credentials) -> Result<ApiEnvelope<AuthData>, ApiError> {
        let body = to_body(credentials)?;
        let response = self
            .execute(Method::POST, LOGIN_PATH, Some(&body), None)
            .await?;
        let envelope: ApiEnvelope<AuthData> = decode(response).await?;
        self.adopt_auth_data(&envelope);
        Ok(envelope)
    }

    /// Creates an account. Same contract shape as [`ApiClient::login`].
    ///
    /// # Errors
    /// Returns an error on transport failure or an undecodable body.
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<ApiEnvelope<AuthData>, ApiError> {
        let body = to_body(registration)?;
        let response = self
            .execute(Method::POST, REGISTER_PATH, Some(&body), None)
            .await?;
        let envelope: ApiEnvelope<AuthData> = decode(response).await?;
        self.adopt_auth_data(&envelope);
        Ok(envelope)
    }

    /// Invalidates the session server-side.
    ///
    /// Tokens are cleared locally whatever the network outcome — local
    /// logout is guaranteed even when the server call fails.
    ///
    /// # Errors
    /// Returns the underlying transport/decode error after clearing tokens.
    pub async fn logout(&self) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        let result = self.send(Method::POST, LOGOUT_PATH, None).await;
        self.clear_tokens();
        result
    }

    /// Exchanges the held refresh token for a new pair.
    ///
    /// Returns false without a network call when no refresh token is held,
    /// and false on any failure. Never clears tokens — the 401 retry path
    /// owns that decision.
    pub async fn refresh_access_token(&self) -> bool {
        let Some(refresh) = self.lock_tokens().refresh_token().map(str::to_string) else {
            return false;
        };

        let body = serde_json::json!({ "refreshToken": refresh });
        let bearer = self.access_token();
        let response = match self
            .execute(Method::POST, REFRESH_PATH, Some(&body), bearer.as_deref())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh request failed");
                return false;
            }
        };

        let envelope: ApiEnvelope<TokenData> = match decode(response).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh response undecodable");
                return false;
            }
        };

        match envelope.data {
            Some(data) if envelope.success => {
                self.store_pair(data.token, data.refresh_token);
                true
            }
            _ => {
                tracing::debug!(
                    reason = envelope.message.as_deref().unwrap_or(""),
                    "token refresh rejected"
                );
                false
            }
        }
    }

    /// Fetches the current user's profile.
    ///
    /// # Errors
    /// Returns an error on transport failure, undecodable body, or an
    /// unrecoverable 401.
    pub async fn profile(&self) -> Result<ApiEnvelope<ProfileData>, ApiError> {
        self.send(Method::GET, PROFILE_PATH, None).await
    }

    /// Updates the current user's profile.
    ///
    /// # Errors
    /// Returns an error on transport failure, undecodable body, or an
    /// unrecoverable 401.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<ApiEnvelope<ProfileData>, ApiError> {
        let body = to_body(update)?;
        self.send(Method::PUT, PROFILE_PATH, Some(body)).await
    }

    /// Changes the account password. Tokens remain valid on success.
    ///
    /// # Errors
    /// Returns an error on transport failure, undecodable body, or an
    /// unrecoverable 401.
    pub async fn change_password(
        &self,
        change: &PasswordChange,
    ) -> Result<ApiEnvelope<serde_json::Value>, ApiError> {
        let body = to_body(change)?;
        self.send(Method::POST, CHANGE_PASSWORD_PATH, Some(body))
            .await
    }

    /// Core authenticated send path with the 401 refresh-retry protocol.
    ///
    /// Any status other than 401 decodes into the envelope as-is; callers
    /// inspect `success`. A 401 with a refresh token in hand triggers exactly
    /// one refresh and one retry; the retried response is final.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let bearer = self.access_token();
        let response = self
            .execute(method.clone(), path, body.as_ref(), bearer.as_deref())
            .await?;

        let expired = response.status() == StatusCode::UNAUTHORIZED
            && path != REFRESH_PATH
            && self.lock_tokens().refresh_token().is_some();
        if expired {
            let fresh = self.refresh_for_retry(bearer.as_deref()).await?;
            let retry = self
                .execute(method, path, body.as_ref(), Some(&fresh))
                .await?;
            return decode(retry).await;
        }

        decode(response).await
    }

    /// Obtains a usable access token after a 401, refreshing at most once.
    ///
    /// Waits on the single-flight gate; if another caller already replaced
    /// the token we failed with, that token is reused without a second
    /// refresh. A failed refresh clears the session.
    async fn refresh_for_retry(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.access_token() {
            if stale != Some(current.as_str()) {
                return Ok(current);
            }
        }

        if self.refresh_access_token().await {
            if let Some(fresh) = self.access_token() {
                return Ok(fresh);
            }
        }

        tracing::info!("token refresh failed, clearing session");
        self.clear_tokens();
        Err(ApiError::session_expired())
    }

    /// Builds and performs one HTTP request. Transport failures are
    /// classified, logged, and returned to the caller.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json");

        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            let classified = classify_reqwest_error(&e);
            tracing::warn!(%url, error = %classified, "request failed");
            classified
        })
    }

    /// Stores the pair from a successful login/register envelope.
    fn adopt_auth_data(&self, envelope: &ApiEnvelope<AuthData>) {
        if !envelope.success {
            return;
        }
        if let Some(data) = &envelope.data {
            self.store_pair(data.token.clone(), data.refresh_token.clone());
        }
    }

    fn store_pair(&self, access: String, refresh: String) {
        if let Err(e) = self.lock_tokens().set(TokenPair { access, refresh }) {
            tracing::warn!(error = %e, "failed to persist session tokens");
        }
    }

    fn lock_tokens(&self) -> std::sync::MutexGuard<'_, TokenStore> {
        self.tokens.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Decodes a response body into the typed envelope.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiEnvelope<T>, ApiError> {
    let status = response.status();
    response.json::<ApiEnvelope<T>>().await.map_err(|e| {
        ApiError::parse(format!(
            "Failed to decode response body (HTTP {status}): {e}"
        ))
    })
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(payload)
        .map_err(|e| ApiError::parse(format!("Failed to serialize request body: {e}")))
}

/// Classifies a reqwest error into an ApiError.
fn classify_reqwest_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ApiError::transport(format!("Connection failed: {e}"))
    } else {
        ApiError::transport(format!("Network error: {e}"))
    }
}
