//! Guard options.
//!
//! Options are loaded from JSON or environment variables, with defaults
//! suitable for development.

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardResult};

/// Role used when a request carries none.
pub const DEFAULT_ROLE: &str = "default";

/// Message reported with allowed requests.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "authorized";

/// Message reported with rejected requests.
pub const DEFAULT_FAILURE_MESSAGE: &str = "authorize failed";

/// Options controlling a guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardOptions {
    /// Role assumed when the request's role cannot be resolved.
    pub default_role: String,

    /// Message attached to continued requests.
    pub success_message: String,

    /// Message attached to rejected requests and default flash text.
    pub failure_message: String,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            default_role: DEFAULT_ROLE.to_string(),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl GuardOptions {
    /// Load options from environment variables.
    ///
    /// Environment variables:
    /// - `ACL_DEFAULT_ROLE`: role for requests without one (default: default)
    /// - `ACL_SUCCESS_MESSAGE`: message for continued requests (default: authorized)
    /// - `ACL_FAILURE_MESSAGE`: message for rejected requests (default: authorize failed)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            default_role: std::env::var("ACL_DEFAULT_ROLE").unwrap_or(default.default_role),
            success_message: std::env::var("ACL_SUCCESS_MESSAGE").unwrap_or(default.success_message),
            failure_message: std::env::var("ACL_FAILURE_MESSAGE").unwrap_or(default.failure_message),
        }
    }

    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> GuardResult<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| GuardError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Set the default role.
    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = role.into();
        self
    }

    /// Set the success message.
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Set the failure message.
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    /// Validate the options.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Config`] when the default role is empty.
    pub fn validate(&self) -> GuardResult<()> {
        if self.default_role.trim().is_empty() {
            return Err(GuardError::Config("default_role must not be empty".to_string()));
        }
        Ok(())
    }
}
