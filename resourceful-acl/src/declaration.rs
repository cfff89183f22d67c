//! # Declarations
//!
//! The author-facing access control list: roles, the resources they own and
//! the methods they may use. Declarations are built either in Rust:
//!
//! ```
//! use resourceful_acl::{AccessControlList, ResourceDecl, RoleDecl};
//!
//! let acl = AccessControlList::new()
//!     .role(
//!         "reader",
//!         RoleDecl::new()
//!             .resource("index", "get")
//!             .resource("posts", "view")
//!             .resource("posts_images", "view"),
//!     )
//!     .role(
//!         "editor",
//!         RoleDecl::new()
//!             .extends("reader")
//!             .resource("posts", ["edit", "delete"])
//!             .resource("contributes", "*")
//!             .resource(
//!                 "customize_resource",
//!                 ResourceDecl::custom(r"^/customize_resource/?(\d+?/?)?$").with_methods(["get", "post"]),
//!             ),
//!     );
//! assert_eq!(acl.len(), 2);
//! ```
//!
//! or loaded from JSON:
//!
//! ```text
//! {
//!   "reader": { "index": "get", "posts": "view" },
//!   "editor": {
//!     "extends": "reader",
//!     "resources": {
//!       "posts": ["edit", "delete"],
//!       "custom": { "path": "^/custom/?$", "methods": "get", "belongs_to": "posts" }
//!     }
//!   }
//! }
//! ```
//!
//! JSON loading is tolerant: unexpected entry shapes degrade to "no methods"
//! with a warning. Only a non-object root is an error.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{AclError, AclResult};
use crate::methods::MethodSpec;
use crate::resources::PathPattern;

const EXTENDS_KEY: &str = "extends";
const RESOURCES_KEY: &str = "resources";

/// Explicit path of a custom resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSource {
    /// Pattern source, compiled case-insensitively at compile time.
    Source(String),
    /// Pre-built pattern, used as-is.
    Pattern(PathPattern),
}

/// A resource entry of a role.
///
/// Fields left as `None` are derived from the resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDecl {
    /// Explicit path pattern.
    pub path: Option<PathSource>,
    /// Methods granted on the resource.
    pub methods: MethodSpec,
    /// Explicit owning resource.
    pub belongs_to: Option<String>,
    /// Explicit priority.
    pub priority: Option<u32>,
}

impl ResourceDecl {
    /// Resource with derived path, owner and priority.
    pub fn methods(methods: impl Into<MethodSpec>) -> Self {
        Self {
            path: None,
            methods: methods.into(),
            belongs_to: None,
            priority: None,
        }
    }

    /// Resource matched by an explicit pattern source.
    ///
    /// Grants no methods until [`with_methods`](Self::with_methods) is called.
    pub fn custom(source: impl Into<String>) -> Self {
        Self {
            path: Some(PathSource::Source(source.into())),
            methods: MethodSpec::Invalid,
            belongs_to: None,
            priority: None,
        }
    }

    /// Resource matched by a pre-built pattern.
    pub fn with_pattern(pattern: impl Into<PathPattern>) -> Self {
        Self {
            path: Some(PathSource::Pattern(pattern.into())),
            methods: MethodSpec::Invalid,
            belongs_to: None,
            priority: None,
        }
    }

    /// Set the granted methods.
    pub fn with_methods(mut self, methods: impl Into<MethodSpec>) -> Self {
        self.methods = methods.into();
        self
    }

    /// Set the owning resource.
    pub fn belongs_to(mut self, owner: impl Into<String>) -> Self {
        self.belongs_to = Some(owner.into());
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    fn from_json(value: &Value) -> Self {
        let Value::Object(entry) = value else {
            return Self::methods(MethodSpec::from_json(value));
        };

        let path = match entry.get("path") {
            Some(Value::String(source)) => Some(PathSource::Source(source.clone())),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(path = %other, "Ignoring non-string resource path");
                None
            }
        };
        let methods = entry
            .get("methods")
            .map(MethodSpec::from_json)
            .unwrap_or(MethodSpec::Invalid);
        let belongs_to = entry
            .get("belongs_to")
            .and_then(Value::as_str)
            .map(str::to_string);
        let priority = entry
            .get("priority")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok());

        Self {
            path,
            methods,
            belongs_to,
            priority,
        }
    }
}

impl From<MethodSpec> for ResourceDecl {
    fn from(methods: MethodSpec) -> Self {
        Self::methods(methods)
    }
}

impl From<&str> for ResourceDecl {
    fn from(methods: &str) -> Self {
        Self::methods(methods)
    }
}

impl From<String> for ResourceDecl {
    fn from(methods: String) -> Self {
        Self::methods(methods)
    }
}

impl From<Vec<&str>> for ResourceDecl {
    fn from(methods: Vec<&str>) -> Self {
        Self::methods(methods)
    }
}

impl From<Vec<String>> for ResourceDecl {
    fn from(methods: Vec<String>) -> Self {
        Self::methods(methods)
    }
}

impl<const N: usize> From<[&str; N]> for ResourceDecl {
    fn from(methods: [&str; N]) -> Self {
        Self::methods(methods)
    }
}

/// A role: its parent roles and the resources it owns directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDecl {
    /// Parent roles, checked in order before this role's own resources.
    pub extends: Vec<String>,
    /// Resources in declaration order.
    pub resources: Vec<(String, ResourceDecl)>,
}

impl RoleDecl {
    /// Create an empty role.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parent role.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends.push(parent.into());
        self
    }

    /// Add or replace a resource.
    ///
    /// A replaced resource keeps its original declaration position.
    pub fn resource(mut self, name: impl Into<String>, decl: impl Into<ResourceDecl>) -> Self {
        let name = name.into();
        let decl = decl.into();
        match self.resources.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = decl,
            None => self.resources.push((name, decl)),
        }
        self
    }

    fn from_json(role: &str, value: &Value) -> Self {
        let Value::Object(entry) = value else {
            tracing::warn!(role, "Role declaration is not an object; it owns no resources");
            return Self::new();
        };

        let extends = match entry.get(EXTENDS_KEY) {
            Some(Value::String(parent)) if parent.is_empty() => Vec::new(),
            Some(Value::String(parent)) => vec![parent.clone()],
            Some(Value::Array(parents)) => parents
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::Null) | Some(Value::Bool(false)) | None => Vec::new(),
            Some(other) => {
                tracing::warn!(role, extends = %other, "Ignoring malformed `extends`");
                Vec::new()
            }
        };

        // only a parent name or a list of parents switches to the `resources` table
        let declares_extends = match entry.get(EXTENDS_KEY) {
            Some(Value::String(parent)) => !parent.is_empty(),
            Some(Value::Array(_)) => true,
            _ => false,
        };
        let resources = if declares_extends {
            let ignored: Vec<&str> = entry
                .keys()
                .map(String::as_str)
                .filter(|k| *k != EXTENDS_KEY && *k != RESOURCES_KEY)
                .collect();
            if !ignored.is_empty() {
                tracing::warn!(
                    role,
                    ?ignored,
                    "Roles with `extends` declare resources under `resources`; ignoring top-level keys"
                );
            }
            match entry.get(RESOURCES_KEY) {
                Some(Value::Object(resources)) => resources_from_json(resources),
                _ => Vec::new(),
            }
        } else {
            entry
                .iter()
                .filter(|(name, _)| *name != EXTENDS_KEY)
                .map(|(name, value)| (name.clone(), ResourceDecl::from_json(value)))
                .collect()
        };

        Self { extends, resources }
    }
}

fn resources_from_json(entries: &Map<String, Value>) -> Vec<(String, ResourceDecl)> {
    entries
        .iter()
        .map(|(name, value)| (name.clone(), ResourceDecl::from_json(value)))
        .collect()
}

/// The declarative table: role name to role declaration, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControlList {
    roles: Vec<(String, RoleDecl)>,
}

impl AccessControlList {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role.
    pub fn role(mut self, name: impl Into<String>, decl: RoleDecl) -> Self {
        self.insert(name, decl);
        self
    }

    /// Add or replace a role in place.
    pub fn insert(&mut self, name: impl Into<String>, decl: RoleDecl) {
        let name = name.into();
        match self.roles.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = decl,
            None => self.roles.push((name, decl)),
        }
    }

    /// Get a role declaration.
    pub fn get(&self, name: &str) -> Option<&RoleDecl> {
        self.roles.iter().find(|(n, _)| n == name).map(|(_, decl)| decl)
    }

    /// Iterate roles in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &RoleDecl)> {
        self.roles.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    /// Number of declared roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Check if no role is declared.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Read a table from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`AclError::InvalidDeclaration`] when the root is not an object.
    pub fn from_json_value(value: &Value) -> AclResult<Self> {
        let Value::Object(roles) = value else {
            return Err(AclError::InvalidDeclaration(
                "access control list must be an object of roles".to_string(),
            ));
        };

        Ok(Self {
            roles: roles
                .iter()
                .map(|(name, decl)| (name.clone(), RoleDecl::from_json(name, decl)))
                .collect(),
        })
    }

    /// Parse a table from JSON text.
    pub fn from_json_str(json: &str) -> AclResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    /// Load a table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> AclResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| AclError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

impl<'de> Deserialize<'de> for AccessControlList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json_value(&value).map_err(serde::de::Error::custom)
    }
}
