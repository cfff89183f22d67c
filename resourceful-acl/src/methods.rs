//! # Methods
//!
//! Method vocabulary for resource declarations and request checks.
//!
//! Two vocabularies live here:
//!
//! - [`MethodGroup`] is the *declaration* vocabulary. `view`, `edit` and
//!   `delete` in a resource declaration expand to concrete HTTP methods via
//!   [`normalize`].
//! - [`classify`] is the *request* vocabulary. It buckets the method of an
//!   incoming request so the ancestor gate knows whether the request reads
//!   or writes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel token granting every method.
pub const ALL_METHODS: &str = "*";

/// Methods that count as a write when a request asks for `edit`.
const EDIT_METHODS: [&str; 3] = ["put", "post", "patch"];

/// Symbolic method groups.
///
/// - **View**: `get`, `head`, `options`
/// - **Edit**: `put`, `post`, `patch`
/// - **Delete**: `delete`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MethodGroup {
    /// Read access.
    View,

    /// Create and update access.
    Edit,

    /// Removal access.
    Delete,
}

impl MethodGroup {
    /// Get the symbolic token of the group.
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodGroup::View => "view",
            MethodGroup::Edit => "edit",
            MethodGroup::Delete => "delete",
        }
    }

    /// Parse a symbolic token.
    ///
    /// # Example
    ///
    /// ```
    /// use resourceful_acl::methods::MethodGroup;
    ///
    /// assert_eq!(MethodGroup::parse("view"), Some(MethodGroup::View));
    /// assert_eq!(MethodGroup::parse("get"), None);
    /// ```
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "view" => Some(MethodGroup::View),
            "edit" => Some(MethodGroup::Edit),
            "delete" => Some(MethodGroup::Delete),
            _ => None,
        }
    }

    /// Concrete HTTP methods the group expands to, in declaration order.
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            MethodGroup::View => &["get", "head", "options"],
            MethodGroup::Edit => &EDIT_METHODS,
            MethodGroup::Delete => &["delete"],
        }
    }

    /// The symbolic method an ancestor gate checks for requests in this group.
    ///
    /// Deleting a nested resource counts as editing its owner.
    pub fn gate_method(&self) -> &'static str {
        match self {
            MethodGroup::View => "view",
            MethodGroup::Edit | MethodGroup::Delete => "edit",
        }
    }
}

/// Classify the method of a request.
///
/// Literal HTTP methods and the symbolic `view` / `edit` tokens are both
/// accepted, since ancestor gates re-enter the checker with symbolic methods.
///
/// # Example
///
/// ```
/// use resourceful_acl::methods::{classify, MethodGroup};
///
/// assert_eq!(classify("head"), Some(MethodGroup::View));
/// assert_eq!(classify("edit"), Some(MethodGroup::Edit));
/// assert_eq!(classify("trace"), None);
/// ```
pub fn classify(method: &str) -> Option<MethodGroup> {
    match method {
        "get" | "head" | "options" | "view" => Some(MethodGroup::View),
        "put" | "post" | "patch" | "edit" => Some(MethodGroup::Edit),
        "delete" => Some(MethodGroup::Delete),
        _ => None,
    }
}

/// Method specification as written by an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSpec {
    /// A single token: `"*"`, a group, or a literal method.
    One(String),

    /// A list of tokens.
    Many(Vec<String>),

    /// Anything else. Normalizes to [`MethodSet::Nothing`].
    Invalid,
}

impl MethodSpec {
    /// Specification granting every method.
    pub fn all() -> Self {
        MethodSpec::One(ALL_METHODS.to_string())
    }

    /// Read a specification from a JSON value.
    ///
    /// Strings and arrays are accepted; non-string array elements are
    /// dropped. Every other shape becomes [`MethodSpec::Invalid`].
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(token) => MethodSpec::One(token.clone()),
            Value::Array(items) => {
                let tokens: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                if tokens.len() != items.len() {
                    tracing::warn!(
                        dropped = items.len() - tokens.len(),
                        "Ignoring non-string method tokens"
                    );
                }
                MethodSpec::Many(tokens)
            }
            _ => MethodSpec::Invalid,
        }
    }
}

impl From<&str> for MethodSpec {
    fn from(token: &str) -> Self {
        MethodSpec::One(token.to_string())
    }
}

impl From<String> for MethodSpec {
    fn from(token: String) -> Self {
        MethodSpec::One(token)
    }
}

impl From<Vec<&str>> for MethodSpec {
    fn from(tokens: Vec<&str>) -> Self {
        MethodSpec::Many(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for MethodSpec {
    fn from(tokens: Vec<String>) -> Self {
        MethodSpec::Many(tokens)
    }
}

impl<const N: usize> From<[&str; N]> for MethodSpec {
    fn from(tokens: [&str; N]) -> Self {
        MethodSpec::Many(tokens.iter().map(|t| t.to_string()).collect())
    }
}

/// Methods a compiled resource permits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MethodSet {
    /// Every method is permitted.
    All,

    /// No method is permitted.
    Nothing,

    /// Only the listed methods are permitted.
    Only(Vec<String>),
}

impl MethodSet {
    /// Check whether the set lists a literal method.
    ///
    /// Symbolic request methods are not interpreted; use
    /// [`permits`](Self::permits) to check a request.
    pub fn contains(&self, method: &str) -> bool {
        match self {
            MethodSet::All => true,
            MethodSet::Nothing => false,
            MethodSet::Only(methods) => methods.iter().any(|m| m == method),
        }
    }

    /// Check whether a request method is permitted.
    ///
    /// A request for `edit` is permitted by any of `post`, `patch`, `put`;
    /// a request for `view` is permitted by `get`.
    ///
    /// # Example
    ///
    /// ```
    /// use resourceful_acl::methods::{normalize, MethodSpec};
    ///
    /// let set = normalize(&MethodSpec::from("edit"));
    /// assert!(set.permits("edit"));
    /// assert!(set.permits("patch"));
    /// assert!(!set.permits("view"));
    /// ```
    pub fn permits(&self, method: &str) -> bool {
        match self {
            MethodSet::All => true,
            MethodSet::Nothing => false,
            MethodSet::Only(methods) => match method {
                "edit" => methods.iter().any(|m| EDIT_METHODS.contains(&m.as_str())),
                "view" => methods.iter().any(|m| m == "get"),
                _ => methods.iter().any(|m| m == method),
            },
        }
    }
}

/// Expand a method specification into a method set.
///
/// # Example
///
/// ```
/// use resourceful_acl::methods::{normalize, MethodSet, MethodSpec};
///
/// assert_eq!(normalize(&MethodSpec::all()), MethodSet::All);
/// assert_eq!(
///     normalize(&MethodSpec::from(["view", "delete"])),
///     MethodSet::Only(vec!["get".into(), "head".into(), "options".into(), "delete".into()])
/// );
/// ```
pub fn normalize(spec: &MethodSpec) -> MethodSet {
    match spec {
        MethodSpec::One(token) if token == ALL_METHODS => MethodSet::All,
        MethodSpec::One(token) => MethodSet::Only(expand(token)),
        MethodSpec::Many(tokens) => MethodSet::Only(tokens.iter().flat_map(|t| expand(t)).collect()),
        MethodSpec::Invalid => MethodSet::Nothing,
    }
}

fn expand(token: &str) -> Vec<String> {
    match MethodGroup::parse(token) {
        Some(group) => group.methods().iter().map(|m| m.to_string()).collect(),
        None => vec![token.to_string()],
    }
}
