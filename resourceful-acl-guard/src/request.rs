//! Request view and role resolution.
//!
//! The guard never depends on a web framework. Adapters implement
//! [`RequestView`] for their request type and, when roles live somewhere
//! other than the request itself, a [`RoleResolver`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GuardResult;

/// One role or an ordered list of roles held by a requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleSelection {
    /// A single role.
    One(String),
    /// Several roles, tried in order.
    Many(Vec<String>),
}

impl RoleSelection {
    /// Iterate the roles in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let roles: &[String] = match self {
            RoleSelection::One(role) => std::slice::from_ref(role),
            RoleSelection::Many(roles) => roles,
        };
        roles.iter().map(String::as_str)
    }

    /// Check if no role is selected.
    pub fn is_empty(&self) -> bool {
        matches!(self, RoleSelection::Many(roles) if roles.is_empty())
    }
}

impl From<&str> for RoleSelection {
    fn from(role: &str) -> Self {
        RoleSelection::One(role.to_string())
    }
}

impl From<String> for RoleSelection {
    fn from(role: String) -> Self {
        RoleSelection::One(role)
    }
}

impl From<Vec<&str>> for RoleSelection {
    fn from(roles: Vec<&str>) -> Self {
        RoleSelection::Many(roles.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for RoleSelection {
    fn from(roles: Vec<String>) -> Self {
        RoleSelection::Many(roles)
    }
}

/// What the guard needs to know about a request.
pub trait RequestView {
    /// HTTP method, in any case.
    fn method(&self) -> &str;

    /// Path relative to the mount point.
    fn path(&self) -> &str;

    /// Mount point of the handler, if any.
    fn base_url(&self) -> &str {
        ""
    }

    /// Role attached to the request, typically by an authentication layer.
    fn role(&self) -> Option<RoleSelection> {
        None
    }

    /// Full request path checked against the access control list.
    fn full_path(&self) -> String {
        join_path(self.base_url(), self.path())
    }
}

/// Resolves the roles of a request.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Resolve the roles. `Ok(None)` means the request has no role.
    async fn resolve(&self, request: &(dyn RequestView + Sync)) -> GuardResult<Option<RoleSelection>>;
}

/// Resolver reading [`RequestView::role`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachedRole;

#[async_trait]
impl RoleResolver for AttachedRole {
    async fn resolve(&self, request: &(dyn RequestView + Sync)) -> GuardResult<Option<RoleSelection>> {
        Ok(request.role())
    }
}

/// Resolver backed by a synchronous closure.
pub struct FnResolver<F> {
    resolve: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&(dyn RequestView + Sync)) -> GuardResult<Option<RoleSelection>> + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

impl<F> std::fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> RoleResolver for FnResolver<F>
where
    F: Fn(&(dyn RequestView + Sync)) -> GuardResult<Option<RoleSelection>> + Send + Sync,
{
    async fn resolve(&self, request: &(dyn RequestView + Sync)) -> GuardResult<Option<RoleSelection>> {
        (self.resolve)(request)
    }
}

/// Join a mount point and a path the way POSIX path joining does.
///
/// Empty segments and `.` are dropped, `..` removes the previous segment,
/// and a trailing slash is kept.
///
/// # Example
///
/// ```
/// use resourceful_acl_guard::request::join_path;
///
/// assert_eq!(join_path("/api", "/posts/1"), "/api/posts/1");
/// assert_eq!(join_path("", "/posts//1/"), "/posts/1/");
/// assert_eq!(join_path("/api/v1", "../v2/posts"), "/api/v2/posts");
/// ```
pub fn join_path(base: &str, path: &str) -> String {
    let joined = match (base.is_empty(), path.is_empty()) {
        (true, true) => return ".".to_string(),
        (true, false) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{path}"),
    };

    let absolute = joined.starts_with('/');
    let trailing = joined.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut normalized = segments.join("/");
    if absolute {
        normalized.insert(0, '/');
    } else if normalized.is_empty() {
        normalized.push('.');
    }
    if trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
