//! # Resourceful ACL
//!
//! Declarative, resource-oriented access control for RESTful paths.
//!
//! ## Overview
//!
//! The resourceful-acl crate handles:
//! - **Methods**: symbolic groups (`view`, `edit`, `delete`, `*`) expanded to HTTP methods
//! - **Resources**: resource names compiled into path patterns
//! - **Roles**: role tables compiled into priority-ordered matchers
//! - **Checks**: the decision for a role, a path and a method
//!
//! ## Architecture
//!
//! ```text
//! AccessControlList --compile--> CompiledAcl --check(role, path, method)--> CheckResult
//!
//! Resource names:
//!   "index"              - GET /
//!   "posts"              - /posts, /posts/:id, /posts/:id/:action
//!   "posts_attachments"  - /posts/:id/attachments[/:id[/:action]], owned by "posts"
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use resourceful_acl::{compile, AccessControlList, CheckStatus};
//!
//! let acl = AccessControlList::from_json_str(r#"{
//!     "reader": { "index": "get", "posts": "view", "posts_images": "view" },
//!     "editor": {
//!         "extends": "reader",
//!         "resources": { "posts": ["edit", "delete"], "posts_images": ["edit", "delete"] }
//!     }
//! }"#).unwrap();
//! let compiled = compile(&acl).unwrap();
//!
//! assert_eq!(compiled.check("reader", "/posts/1", "get").status, CheckStatus::Allowed);
//! assert_eq!(compiled.check("reader", "/posts/1", "put").status, CheckStatus::Denied);
//! assert_eq!(compiled.check("editor", "/posts/1/images/2", "delete").status, CheckStatus::Allowed);
//! ```
//!
//! ## Inheritance
//!
//! - **Roles**: a role that `extends` others is allowed everything its parents allow
//! - **Resources**: a nested resource is only reachable when its owner is:
//!   viewing needs `view` on the owner, editing or deleting needs `edit`
//!
//! The compiled table is immutable; share it behind an `Arc` and check from
//! as many threads as needed.

pub mod checker;
pub mod declaration;
pub mod error;
pub mod methods;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use checker::{check, CheckResult, CheckStatus};
pub use declaration::{AccessControlList, PathSource, ResourceDecl, RoleDecl};
pub use error::{AclError, AclResult};
pub use methods::{classify, normalize, MethodGroup, MethodSet, MethodSpec};
pub use resources::{compile_path, member_path, PathPattern, ResourcePath};
pub use roles::{compile, CompiledAcl, CompiledResource, CompiledRole};
