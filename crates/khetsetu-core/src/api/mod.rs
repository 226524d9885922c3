//! Backend API layer: typed envelopes, token lifecycle, and the HTTP client.

mod client;
mod error;
mod tokens;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind};
pub use tokens::{mask_token, TokenPair, TokenStore};
pub use types::{
    ApiEnvelope, AuthData, Credentials, FarmProfile, PasswordChange, ProfileData, ProfileUpdate,
    Registration, TokenData, User,
};
