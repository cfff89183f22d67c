//! # Resourceful ACL Guard
//!
//! Framework-neutral request guarding on top of `resourceful-acl`.
//!
//! ## Overview
//!
//! The resourceful-acl-guard crate handles:
//! - **Requests**: the method, path and mount point of an incoming request
//! - **Roles**: resolving the roles of a request, with a default role fallback
//! - **Outcomes**: continue, reject with 403, or redirect with a flash message
//!
//! ## Usage
//!
//! ```rust
//! use resourceful_acl::AccessControlList;
//! use resourceful_acl_guard::{Guard, GuardOptions, Outcome, RequestView, RoleSelection};
//!
//! struct Request {
//!     method: String,
//!     path: String,
//!     role: Option<String>,
//! }
//!
//! impl RequestView for Request {
//!     fn method(&self) -> &str {
//!         &self.method
//!     }
//!
//!     fn path(&self) -> &str {
//!         &self.path
//!     }
//!
//!     fn role(&self) -> Option<RoleSelection> {
//!         self.role.clone().map(RoleSelection::One)
//!     }
//! }
//!
//! # tokio_test_block(async {
//! let acl = AccessControlList::from_json_str(r#"{
//!     "reader": { "posts": "view" },
//!     "editor": { "extends": "reader", "resources": { "posts": "edit" } }
//! }"#).unwrap();
//! let guard = Guard::from_declaration(GuardOptions::default().with_default_role("reader"), &acl).unwrap();
//!
//! let request = Request { method: "POST".into(), path: "/posts/1".into(), role: None };
//! let decision = guard.authorize(&request).await;
//! assert!(matches!(decision.outcome, Outcome::Reject { .. }));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Roles
//!
//! When a request carries several roles they are checked in order. The first
//! role that is allowed decides; an undefined role rejects immediately.

pub mod error;
pub mod guard;
pub mod options;
pub mod request;

// Re-export main types for convenience
pub use error::{GuardError, GuardResult};
pub use guard::{Decision, FailureMode, Flash, Guard, Outcome, REDIRECT_STATUS};
pub use options::GuardOptions;
pub use request::{join_path, AttachedRole, FnResolver, RequestView, RoleResolver, RoleSelection};

// Re-export the access control list crate
pub use resourceful_acl;
