//! Error types for access control list compilation
//!
//! Decisions are never errors: an unknown role, a denied method or an
//! unmatched path are reported through [`CheckStatus`](crate::CheckStatus).
//! The variants here cover configuration problems found while loading or
//! compiling a declarative table.

use thiserror::Error;

/// Access control list configuration errors.
#[derive(Debug, Error)]
pub enum AclError {
    /// Role inheritance graph contains a cycle
    #[error("Cyclic role inheritance detected: {0}")]
    CyclicRoleInheritance(String),

    /// `belongs_to` links of a role's resources form a cycle
    #[error("Cyclic resource ownership in role `{role}`: {chain}")]
    CyclicResourceOwnership {
        /// Role declaring the resources.
        role: String,
        /// The ownership chain that loops.
        chain: String,
    },

    /// An explicit resource path is not a valid pattern
    #[error("Invalid path pattern for resource `{resource}`: {source}")]
    InvalidPattern {
        /// Resource the pattern was declared on.
        resource: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The declarative table has the wrong shape
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read a declaration file
    #[error("Failed to read access control list `{path}`")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for access control list operations.
pub type AclResult<T> = Result<T, AclError>;

impl AclError {
    /// Get error code for diagnostics and API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AclError::CyclicRoleInheritance(_) => "CYCLIC_ROLE_INHERITANCE",
            AclError::CyclicResourceOwnership { .. } => "CYCLIC_RESOURCE_OWNERSHIP",
            AclError::InvalidPattern { .. } => "INVALID_PATTERN",
            AclError::InvalidDeclaration(_) => "INVALID_DECLARATION",
            AclError::Json(_) => "JSON_ERROR",
            AclError::Io { .. } => "IO_ERROR",
        }
    }
}
