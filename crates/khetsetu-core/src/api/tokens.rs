//! Session token storage and retrieval.
//!
//! Persists the access/refresh pair in `<base>/session.json` with restricted
//! permissions (0600). Tokens are never logged or displayed in full.
//!
//! The pair lives in one document, so replacing it is all-or-nothing: storage
//! never holds a new access token next to a stale refresh token.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// An access/refresh token pair issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived credential sent with each authenticated request.
    pub access: String,
    /// Longer-lived credential exchanged for a new pair on expiry.
    pub refresh: String,
}

/// On-disk document. Field names match the storage keys the web client used.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "authToken")]
    auth_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Holds the in-memory token pair and mirrors it to durable storage.
///
/// Hydrated from disk exactly once at construction; reads afterwards are pure
/// in-memory lookups.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    access: Option<String>,
    refresh: Option<String>,
}

impl TokenStore {
    /// Opens the store backed by the given file, hydrating any persisted pair.
    ///
    /// A missing file yields an empty (anonymous) store.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                access: None,
                refresh: None,
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session from {}", path.display()))?;
        let stored: StoredSession = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", path.display()))?;

        Ok(Self {
            path,
            access: Some(stored.auth_token),
            refresh: Some(stored.refresh_token),
        })
    }

    /// Opens the store at the default session path under the KhetSetu home.
    ///
    /// # Errors
    /// Returns an error if an existing session file cannot be read or parsed.
    pub fn open_default() -> Result<Self> {
        Self::open(paths::session_path())
    }

    /// Replaces the held pair, persisting synchronously.
    ///
    /// The in-memory fields are updated before the write, so a caller
    /// observing a completed `set` always reads the new pair even if
    /// persistence degrades.
    ///
    /// # Errors
    /// Returns an error if the pair cannot be written to disk.
    pub fn set(&mut self, pair: TokenPair) -> Result<()> {
        self.access = Some(pair.access);
        self.refresh = Some(pair.refresh);
        self.persist()
    }

    /// Clears both tokens and removes the persisted document.
    ///
    /// # Errors
    /// Returns an error if an existing session file cannot be removed.
    pub fn clear(&mut self) -> Result<()> {
        self.access = None;
        self.refresh = None;

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session at {}", self.path.display())),
        }
    }

    /// Returns the held access token, if any. Pure in-memory read.
    pub fn access_token(&self) -> Option<&str> {
        self.access.as_deref()
    }

    /// Returns the held refresh token, if any. Pure in-memory read.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh.as_deref()
    }

    /// Returns true if an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    /// Writes the current pair to disk with restricted permissions (0600).
    fn persist(&self) -> Result<()> {
        let (Some(access), Some(refresh)) = (&self.access, &self.refresh) else {
            anyhow::bail!("Refusing to persist a partial token pair");
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let stored = StoredSession {
            auth_token: access.clone(),
            refresh_token: refresh.clone(),
        };
        let contents =
            serde_json::to_string_pretty(&stored).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
