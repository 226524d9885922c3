//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod profile;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use khetsetu_core::api::{ApiClient, FarmProfile, TokenStore};
use khetsetu_core::auth::SessionManager;
use khetsetu_core::config::Config;

use super::FarmArgs;

/// Builds a session manager against the configured backend.
pub fn build_session() -> Result<SessionManager> {
    let config = Config::load()?;
    let base_url = config.resolve_api_url()?;
    let tokens = TokenStore::open_default()?;
    Ok(SessionManager::new(Arc::new(ApiClient::new(
        base_url, tokens,
    ))))
}

/// Prompts on stderr and reads one line from stdin.
pub fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}: ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

impl FarmArgs {
    /// Converts supplied farm flags into the wire profile, if any were given.
    pub fn into_profile(self) -> Option<FarmProfile> {
        if self.is_empty() {
            return None;
        }
        Some(FarmProfile {
            village: self.village,
            district: self.district,
            state: self.state,
            land_size_acres: self.land_size,
            soil_type: self.soil,
            irrigation_source: self.irrigation,
            primary_crops: self.crops,
        })
    }
}
