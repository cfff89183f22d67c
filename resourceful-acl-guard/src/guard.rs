//! Request guard.
//!
//! A [`Guard`] resolves the roles of a request, checks them against a
//! compiled access control list and turns the result into an [`Outcome`]:
//!
//! - allowed, or no resource claims the path: continue
//! - denied, or the role is undefined: reject with 403, or redirect

use chrono::{Duration, Utc};
use resourceful_acl::{compile, AccessControlList, AclResult, CheckResult, CheckStatus, CompiledAcl};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{GuardError, GuardResult};
use crate::options::GuardOptions;
use crate::request::{AttachedRole, RequestView, RoleResolver, RoleSelection};

/// Status code of failure redirects.
pub const REDIRECT_STATUS: u16 = 303;

/// Flash message attached to failure redirects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flash {
    /// No flash message.
    #[default]
    Off,
    /// Flash the configured failure message.
    Default,
    /// Flash a custom message.
    Message(String),
}

/// How rejected requests are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Reject with [`GuardError::Unauthorized`].
    #[default]
    Error,
    /// Redirect to a location, e.g. a login page.
    Redirect {
        /// Redirect target.
        location: String,
        /// Flash message for the target page.
        #[serde(default)]
        flash: Flash,
    },
}

/// What the caller should do with the request.
#[derive(Debug)]
pub enum Outcome {
    /// Hand the request to the next handler.
    Continue {
        /// Configured success message.
        message: String,
    },
    /// Fail the request.
    Reject {
        /// Rejection reason; maps to a 403.
        error: GuardError,
        /// Configured failure message.
        message: String,
    },
    /// Redirect the client.
    Redirect {
        /// HTTP status, always [`REDIRECT_STATUS`].
        status: u16,
        /// Redirect target.
        location: String,
        /// Flash message to store, if any.
        flash: Option<String>,
    },
}

/// Outcome of guarding one request, with the check behind it.
#[derive(Debug)]
pub struct Decision {
    /// What to do with the request.
    pub outcome: Outcome,
    /// The deciding check.
    pub result: CheckResult,
    /// Time spent resolving roles and checking.
    pub elapsed: Duration,
}

impl Decision {
    /// Check if the request may continue.
    pub fn is_continue(&self) -> bool {
        matches!(self.outcome, Outcome::Continue { .. })
    }

    /// Convert into the check result, or the rejection error.
    ///
    /// Redirects are reported as errors too; callers that redirect should
    /// match on [`Decision::outcome`] instead.
    pub fn into_result(self) -> GuardResult<CheckResult> {
        match self.outcome {
            Outcome::Continue { .. } => Ok(self.result),
            Outcome::Reject { error, .. } => Err(error),
            Outcome::Redirect { .. } => Err(unauthorized(&self.result)),
        }
    }
}

/// Guards requests with a compiled access control list.
#[derive(Clone)]
pub struct Guard {
    acl: Arc<CompiledAcl>,
    options: GuardOptions,
    resolver: Arc<dyn RoleResolver>,
    failure: FailureMode,
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("roles", &self.acl.len())
            .field("options", &self.options)
            .field("failure", &self.failure)
            .finish()
    }
}

impl Guard {
    /// Create a guard with default options, reading roles from the request.
    pub fn new(acl: Arc<CompiledAcl>) -> Self {
        Self {
            acl,
            options: GuardOptions::default(),
            resolver: Arc::new(AttachedRole),
            failure: FailureMode::Error,
        }
    }

    /// Compile a declaration and guard with it.
    ///
    /// # Errors
    ///
    /// Returns the compilation error of the declaration.
    pub fn from_declaration(options: GuardOptions, declaration: &AccessControlList) -> AclResult<Self> {
        Ok(Self::new(Arc::new(compile(declaration)?)).with_options(options))
    }

    /// Replace the options.
    pub fn with_options(mut self, options: GuardOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the role resolver.
    pub fn with_resolver(mut self, resolver: impl RoleResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Replace how rejections are reported.
    pub fn with_failure_mode(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }

    /// Redirect rejected requests.
    pub fn redirect_on_failure(self, location: impl Into<String>, flash: Flash) -> Self {
        self.with_failure_mode(FailureMode::Redirect {
            location: location.into(),
            flash,
        })
    }

    /// Get the options.
    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    /// Get the options for modification.
    pub fn options_mut(&mut self) -> &mut GuardOptions {
        &mut self.options
    }

    /// Get the compiled access control list.
    pub fn acl(&self) -> &CompiledAcl {
        &self.acl
    }

    /// Check several roles in order.
    ///
    /// Stops at the first role that is allowed or undefined; an undefined
    /// role is authoritative and rejects without trying the rest. Otherwise
    /// the last role's result stands. An empty selection checks the default
    /// role.
    pub fn check_roles(&self, roles: &RoleSelection, path: &str, method: &str) -> CheckResult {
        let mut last = None;
        for role in roles.iter() {
            let result = self.acl.check(role, path, method);
            if matches!(result.status, CheckStatus::Allowed | CheckStatus::RoleUndefined) {
                return result;
            }
            last = Some(result);
        }
        last.unwrap_or_else(|| self.acl.check(&self.options.default_role, path, method))
    }

    /// Guard a request.
    pub async fn authorize(&self, request: &(dyn RequestView + Sync)) -> Decision {
        let started = Utc::now();
        let path = request.full_path();
        let method = request.method().to_lowercase();

        let roles = match self.resolver.resolve(request).await {
            Ok(Some(roles)) => roles,
            Ok(None) => RoleSelection::One(self.options.default_role.clone()),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    default_role = %self.options.default_role,
                    "Role resolution failed; using default role"
                );
                RoleSelection::One(self.options.default_role.clone())
            }
        };

        let result = self.check_roles(&roles, &path, &method);
        let outcome = self.outcome(&result);
        let elapsed = Utc::now() - started;

        match &outcome {
            Outcome::Continue { .. } => tracing::debug!(
                role = %result.role,
                path = %result.path,
                method = %result.method,
                status = %result.status,
                "Request authorized"
            ),
            _ => tracing::info!(
                role = %result.role,
                path = %result.path,
                method = %result.method,
                status = %result.status,
                resource = ?result.resource,
                "Request rejected"
            ),
        }

        Decision {
            outcome,
            result,
            elapsed,
        }
    }

    fn outcome(&self, result: &CheckResult) -> Outcome {
        if result.is_passable() {
            return Outcome::Continue {
                message: self.options.success_message.clone(),
            };
        }

        match &self.failure {
            FailureMode::Error => Outcome::Reject {
                error: unauthorized(result),
                message: self.options.failure_message.clone(),
            },
            FailureMode::Redirect { location, flash } => Outcome::Redirect {
                status: REDIRECT_STATUS,
                location: location.clone(),
                flash: match flash {
                    Flash::Off => None,
                    Flash::Default => Some(self.options.failure_message.clone()),
                    Flash::Message(text) => Some(text.clone()),
                },
            },
        }
    }
}

fn unauthorized(result: &CheckResult) -> GuardError {
    GuardError::Unauthorized {
        status: result.status,
        role: result.role.clone(),
        resource: result.resource.clone(),
    }
}
