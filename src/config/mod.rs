//! Provider configuration read from the process environment.
//!
//! The credential must exist before any provider client is built. A missing
//! key is a startup failure, never something a run can recover from.

use std::time::Duration;

use crate::error::{Result, StoryError};

/// Preferred credential variable.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Fallback credential variable.
pub const FALLBACK_API_KEY_VAR: &str = "API_KEY";

/// Optional endpoint override (proxies, tests).
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything a provider client needs to connect.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Read configuration from the real environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map).
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR)
            .or_else(|| non_empty(FALLBACK_API_KEY_VAR))
            .ok_or_else(|| {
                StoryError::Configuration(format!(
                    "{API_KEY_VAR} (or {FALLBACK_API_KEY_VAR}) environment variable not set"
                ))
            })?;

        let base_url = non_empty(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
