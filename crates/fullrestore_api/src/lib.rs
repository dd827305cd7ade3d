//! Full Restore API - Tournament backend client
//!
//! Typed REST client for the Full Restore tournament backend, plus the
//! player sign-up reconciliation procedure built on top of it.
//!
//! ## Configuration
//!
//! The client uses `ApiConfig`, loaded once at startup via
//! `ApiConfig::from_env()` and passed to `ApiClient::new`. There are NO
//! runtime environment variable reads in this crate.

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use identity::{
    normalize_handle, resolve_signup, AliasOutcome, IdentityError, PlayerDirectory, SignupOutcome,
    SignupRequest,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        resolve_signup, AliasOutcome, ApiClient, ApiConfig, ApiError, ApiResult, IdentityError,
        PlayerDirectory, SignupOutcome, SignupRequest,
    };
    pub use crate::models::*;
}
