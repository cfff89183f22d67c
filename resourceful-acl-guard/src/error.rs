//! Error types for request guarding
//!
//! This module defines the errors a guard reports: rejected requests,
//! role resolution failures and configuration problems.

use resourceful_acl::CheckStatus;
use thiserror::Error;

/// Guard error types.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The role may not perform the request
    #[error("Unauthorized: role `{role}` is {status} on {}", .resource.as_deref().unwrap_or("<no resource>"))]
    Unauthorized {
        /// Decision that caused the rejection.
        status: CheckStatus,
        /// Role that produced the decision.
        role: String,
        /// Matched resource, if any.
        resource: Option<String>,
    },

    /// The role of the request could not be determined
    #[error("Role resolution failed: {0}")]
    RoleResolution(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Access control list error
    #[error(transparent)]
    Acl(#[from] resourceful_acl::AclError),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;

impl GuardError {
    /// Check if this error should be logged at error level.
    ///
    /// Rejections are expected and should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        !matches!(self, GuardError::Unauthorized { .. })
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GuardError::Unauthorized { .. } => 403,
            GuardError::RoleResolution(_) | GuardError::Config(_) | GuardError::Acl(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            GuardError::Unauthorized { status: CheckStatus::RoleUndefined, .. } => "ROLE_UNDEFINED",
            GuardError::Unauthorized { .. } => "FORBIDDEN",
            GuardError::RoleResolution(_) => "ROLE_RESOLUTION_FAILED",
            GuardError::Config(_) => "CONFIG_ERROR",
            GuardError::Acl(e) => e.error_code(),
        }
    }
}
