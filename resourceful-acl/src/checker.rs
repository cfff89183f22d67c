//! # Checker
//!
//! Decides whether a role may perform a method on a request path.
//!
//! Evaluation order:
//!
//! 1. An undefined role yields [`CheckStatus::RoleUndefined`].
//! 2. Parent roles are checked in order; the first parent that allows the
//!    request decides, and its result is returned unchanged.
//! 3. The role's own resources are scanned from most to least specific. The
//!    first resource whose pattern matches decides: allowed or denied.
//! 4. Nothing matched: [`CheckStatus::NotMatched`].
//!
//! A nested resource additionally requires its owner to allow the request's
//! bucket: viewing `posts_attachments` needs `view` on `posts`, editing or
//! deleting it needs `edit` on `posts`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::methods::classify;
use crate::resources::member_path;
use crate::roles::{CompiledAcl, CompiledResource, CompiledRole};

/// Outcome of a check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// A resource matched and the method is permitted.
    Allowed,

    /// A resource matched but the method, or an ancestor gate, is not permitted.
    Denied,

    /// No resource matched the path. Callers pick their own default.
    NotMatched,

    /// The role is not defined. Never treat as allowed.
    RoleUndefined,
}

impl CheckStatus {
    /// Get the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Allowed => "allowed",
            CheckStatus::Denied => "denied",
            CheckStatus::NotMatched => "not_matched",
            CheckStatus::RoleUndefined => "role_undefined",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of checking a role, path and method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    /// Decision.
    pub status: CheckStatus,
    /// Role that produced the decision; a granting parent when inherited.
    pub role: String,
    /// Matched resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Checked path.
    pub path: String,
    /// Checked method.
    pub method: String,
}

impl CheckResult {
    fn new(status: CheckStatus, role: &str, resource: Option<&str>, path: &str, method: &str) -> Self {
        Self {
            status,
            role: role.to_string(),
            resource: resource.map(str::to_string),
            path: path.to_string(),
            method: method.to_string(),
        }
    }

    /// Check if access is granted.
    pub fn is_allowed(&self) -> bool {
        self.status == CheckStatus::Allowed
    }

    /// Check if the request should proceed: allowed, or no resource claims the path.
    pub fn is_passable(&self) -> bool {
        matches!(self.status, CheckStatus::Allowed | CheckStatus::NotMatched)
    }
}

/// Check a request against a compiled table.
///
/// `method` is a lowercase HTTP method, or the symbolic `view` / `edit`.
///
/// # Example
///
/// ```
/// use resourceful_acl::{check, compile, AccessControlList, CheckStatus, RoleDecl};
///
/// let acl = compile(&AccessControlList::new().role("reader", RoleDecl::new().resource("posts", "view"))).unwrap();
///
/// assert_eq!(check(&acl, "reader", "/posts/42", "get").status, CheckStatus::Allowed);
/// assert_eq!(check(&acl, "reader", "/posts/42", "delete").status, CheckStatus::Denied);
/// assert_eq!(check(&acl, "reader", "/users", "get").status, CheckStatus::NotMatched);
/// assert_eq!(check(&acl, "ghost", "/posts", "get").status, CheckStatus::RoleUndefined);
/// ```
pub fn check(acl: &CompiledAcl, role: &str, path: &str, method: &str) -> CheckResult {
    let result = evaluate(acl, role, path, method);
    tracing::debug!(
        role,
        path,
        method,
        status = %result.status,
        resource = ?result.resource,
        decided_by = %result.role,
        "Checked access"
    );
    result
}

impl CompiledAcl {
    /// Check a request against this table. See [`check`].
    pub fn check(&self, role: &str, path: &str, method: &str) -> CheckResult {
        check(self, role, path, method)
    }
}

/// Parents are walked depth-first, in declaration order, before a role's own
/// resources. Each role is evaluated at most once per check: a role reached
/// again through another inheritance path already produced a non-allowed
/// result.
fn evaluate(acl: &CompiledAcl, role: &str, path: &str, method: &str) -> CheckResult {
    let Some(compiled) = acl.role(role) else {
        return CheckResult::new(CheckStatus::RoleUndefined, role, None, path, method);
    };

    let mut seen: HashSet<&str> = HashSet::from([role]);
    let mut stack: Vec<(&str, &CompiledRole, usize)> = vec![(role, compiled, 0)];

    while let Some(frame) = stack.last_mut() {
        let (name, current) = (frame.0, frame.1);
        if let Some(parent) = current.parents.get(frame.2) {
            frame.2 += 1;
            // undefined parents never grant anything
            if let Some(parent_role) = acl.role(parent) {
                if seen.insert(parent.as_str()) {
                    stack.push((parent.as_str(), parent_role, 0));
                }
            }
            continue;
        }

        let result = scan(current, name, path, method);
        stack.pop();
        if result.is_allowed() || stack.is_empty() {
            return result;
        }
    }

    CheckResult::new(CheckStatus::NotMatched, role, None, path, method)
}

/// Own resources, highest priority first; the first match decides.
fn scan(role: &CompiledRole, name: &str, path: &str, method: &str) -> CheckResult {
    match role.resources.iter().rev().find(|r| r.pattern.matches(path)) {
        Some(resource) => {
            let status = if method_allowed(role, resource, method) {
                CheckStatus::Allowed
            } else {
                CheckStatus::Denied
            };
            CheckResult::new(status, name, Some(&resource.name), path, method)
        }
        None => CheckResult::new(CheckStatus::NotMatched, name, None, path, method),
    }
}

/// The resource's own methods, then the ancestor gate up the `belongs_to` chain.
fn method_allowed(role: &CompiledRole, resource: &CompiledResource, method: &str) -> bool {
    let mut current = resource;
    let mut method = method;

    loop {
        if !current.methods.permits(method) {
            return false;
        }
        let (Some(owner), Some(group)) = (current.belongs_to.as_deref(), classify(method)) else {
            return true;
        };

        let gate_method = group.gate_method();
        let parent = role.resource(owner);
        tracing::trace!(
            resource = %current.name,
            owner,
            gate_path = %member_path(&current.name),
            gate_method,
            owner_declared = parent.is_some(),
            "Checking ancestor gate"
        );

        match parent {
            Some(parent) => {
                current = parent;
                method = gate_method;
            }
            None => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{AccessControlList, RoleDecl};
    use crate::roles::compile;

    fn blog() -> CompiledAcl {
        compile(
            &AccessControlList::new()
                .role(
                    "reader",
                    RoleDecl::new()
                        .resource("index", "get")
                        .resource("posts", "get")
                        .resource("posts_attachments", "get"),
                )
                .role(
                    "editor",
                    RoleDecl::new()
                        .extends("reader")
                        .resource("posts", ["edit"])
                        .resource("posts_attachments", ["delete"]),
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_role_undefined() {
        let result = check(&blog(), "ghost", "/", "get");
        assert_eq!(result.status, CheckStatus::RoleUndefined);
        assert_eq!(result.role, "ghost");
        assert_eq!(result.resource, None);
        assert!(!result.is_passable());
    }

    #[test]
    fn test_not_matched() {
        let result = check(&blog(), "reader", "/nonexistent", "get");
        assert_eq!(result.status, CheckStatus::NotMatched);
        assert_eq!(result.resource, None);
        assert!(result.is_passable());
    }

    #[test]
    fn test_result_echoes_request() {
        let result = check(&blog(), "reader", "/posts/42", "get");
        assert_eq!(
            result,
            CheckResult {
                status: CheckStatus::Allowed,
                role: "reader".to_string(),
                resource: Some("posts".to_string()),
                path: "/posts/42".to_string(),
                method: "get".to_string(),
            }
        );
    }

    #[test]
    fn test_nested_resource_tried_first() {
        let result = check(&blog(), "reader", "/posts/42/attachments/7", "get");
        assert_eq!(result.resource.as_deref(), Some("posts_attachments"));
        assert!(result.is_allowed());
    }

    #[test]
    fn test_inherited_result_is_returned_verbatim() {
        let acl = blog();
        let inherited = check(&acl, "editor", "/", "get");
        assert_eq!(inherited, check(&acl, "reader", "/", "get"));
        assert_eq!(inherited.role, "reader");
    }

    #[test]
    fn test_own_resources_after_parents() {
        let result = check(&blog(), "editor", "/posts/42", "patch");
        assert!(result.is_allowed());
        assert_eq!(result.role, "editor");

        let result = check(&blog(), "editor", "/posts/42", "delete");
        assert_eq!(result.status, CheckStatus::Denied);
        assert_eq!(result.role, "editor");
    }

    #[test]
    fn test_match_short_circuits_scan() {
        // `posts_attachments` matches first and denies, even though `posts` grants everything
        let acl = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new().resource("posts", "*").resource("posts_attachments", "get"),
        ))
        .unwrap();
        let result = check(&acl, "r", "/posts/1/attachments", "post");
        assert_eq!(result.status, CheckStatus::Denied);
        assert_eq!(result.resource.as_deref(), Some("posts_attachments"));
    }

    #[test]
    fn test_equal_priority_last_declared_wins() {
        let acl = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new()
                .resource("first", crate::ResourceDecl::custom("^/shared$").with_methods("get"))
                .resource("second", crate::ResourceDecl::custom("^/shared$").with_methods("post")),
        ))
        .unwrap();
        let result = check(&acl, "r", "/shared", "get");
        assert_eq!(result.resource.as_deref(), Some("second"));
        assert_eq!(result.status, CheckStatus::Denied);
    }

    #[test]
    fn test_ancestor_gate() {
        let denied = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new().resource("posts", "edit").resource("posts_attachments", "view"),
        ))
        .unwrap();
        assert_eq!(
            check(&denied, "r", "/posts/7/attachments/3", "get").status,
            CheckStatus::Denied
        );

        let allowed = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new().resource("posts", "view").resource("posts_attachments", "view"),
        ))
        .unwrap();
        assert_eq!(
            check(&allowed, "r", "/posts/7/attachments/3", "get").status,
            CheckStatus::Allowed
        );
    }

    #[test]
    fn test_delete_gated_by_edit_on_owner() {
        let acl = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new().resource("posts", "view").resource("posts_attachments", "*"),
        ))
        .unwrap();
        assert_eq!(check(&acl, "r", "/posts/7/attachments/3", "delete").status, CheckStatus::Denied);
        assert_eq!(check(&acl, "r", "/posts/7/attachments/3", "get").status, CheckStatus::Allowed);
        // unclassified methods skip the gate
        assert_eq!(check(&acl, "r", "/posts/7/attachments/3", "trace").status, CheckStatus::Allowed);
    }

    #[test]
    fn test_gate_follows_whole_ancestry() {
        let acl = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new()
                .resource("users", "get")
                .resource("users_posts", "*")
                .resource("users_posts_comments", "*"),
        ))
        .unwrap();
        assert!(check(&acl, "r", "/users/1/posts/2/comments/3", "get").is_allowed());
        // editing comments needs `edit` on posts, which in turn needs `edit` on users
        assert_eq!(
            check(&acl, "r", "/users/1/posts/2/comments/3", "post").status,
            CheckStatus::Denied
        );
    }

    #[test]
    fn test_gate_requires_owner_in_same_role() {
        let acl = compile(
            &AccessControlList::new()
                .role("reader", RoleDecl::new().resource("posts", "view"))
                .role("annotator", RoleDecl::new().extends("reader").resource("posts_notes", "*")),
        )
        .unwrap();
        assert_eq!(check(&acl, "annotator", "/posts/1/notes/2", "get").status, CheckStatus::Denied);
    }

    #[test]
    fn test_symbolic_request_methods() {
        let acl = compile(&AccessControlList::new().role(
            "r",
            RoleDecl::new().resource("posts", ["get", "patch"]).resource("drafts", "head"),
        ))
        .unwrap();
        assert!(check(&acl, "r", "/posts", "view").is_allowed());
        assert!(check(&acl, "r", "/posts", "edit").is_allowed());
        assert!(!check(&acl, "r", "/drafts", "view").is_allowed());
    }

    #[test]
    fn test_check_is_pure() {
        let acl = blog();
        let first = acl.check("editor", "/posts/1/attachments/2", "delete");
        let second = acl.check("editor", "/posts/1/attachments/2", "delete");
        assert_eq!(first, second);
        assert!(first.is_allowed());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&CheckStatus::RoleUndefined).unwrap();
        assert_eq!(json, "\"role_undefined\"");
        assert_eq!(CheckStatus::NotMatched.to_string(), "not_matched");
    }

    #[test]
    fn test_layered_diamonds_are_evaluated_once_per_role() {
        let mut acl = AccessControlList::new()
            .role("l0a", RoleDecl::new().resource("index", "get"))
            .role("l0b", RoleDecl::new().resource("posts", "get"));
        for layer in 1..=40 {
            let below = layer - 1;
            for side in ["a", "b"] {
                acl.insert(
                    format!("l{layer}{side}"),
                    RoleDecl::new().extends(format!("l{below}a")).extends(format!("l{below}b")),
                );
            }
        }
        let acl = compile(&acl).unwrap();

        assert_eq!(check(&acl, "l40a", "/other", "get").status, CheckStatus::NotMatched);
        assert_eq!(check(&acl, "l40a", "/posts/1", "delete").status, CheckStatus::NotMatched);

        let granted = check(&acl, "l40b", "/posts/1", "get");
        assert!(granted.is_allowed());
        assert_eq!(granted.role, "l0b");
    }

    #[test]
    fn test_parents_checked_depth_first_in_order() {
        let acl = compile(
            &AccessControlList::new()
                .role("base", RoleDecl::new().resource("posts", "get"))
                .role("left", RoleDecl::new().extends("base").resource("posts", "*"))
                .role("right", RoleDecl::new().resource("posts", "*"))
                .role("top", RoleDecl::new().extends("left").extends("right")),
        )
        .unwrap();

        assert_eq!(check(&acl, "top", "/posts/1", "get").role, "base");
        assert_eq!(check(&acl, "top", "/posts/1", "delete").role, "left");
    }

    #[test]
    fn test_long_inheritance_chain() {
        let mut acl = AccessControlList::new().role("role0", RoleDecl::new().resource("index", "get"));
        for i in 1..10_000 {
            acl.insert(format!("role{i}"), RoleDecl::new().extends(format!("role{}", i - 1)));
        }
        let acl = compile(&acl).unwrap();

        let result = check(&acl, "role9999", "/", "get");
        assert!(result.is_allowed());
        assert_eq!(result.role, "role0");
    }
}
