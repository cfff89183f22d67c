//! End-to-end tests for compiling and checking a blog access control list.
//!
//! Roles under test:
//! 1. reader: views the index, posts and post attachments
//! 2. contributor: owns manuscripts and a custom-pattern resource
//! 3. editor: extends both, edits posts and deletes attachments

use resourceful_acl::{compile, AccessControlList, CheckResult, CheckStatus, CompiledAcl};
use std::sync::Arc;

const EDIT: [&str; 3] = ["post", "put", "patch"];
const INDEX_PATH: &str = "/";
const POSTS_PATHS: [&str; 3] = ["/posts", "/posts/:id", "/posts/:id/mix"];
const POSTS_ATTACHMENTS_PATHS: [&str; 3] = [
    "/posts/:id/attachments",
    "/posts/:id/attachments/:id",
    "/posts/:id/attachments/:id/method",
];
const MANUSCRIPTS_PATHS: [&str; 5] = [
    "/manuscripts",
    "/manuscripts/",
    "/manuscripts/:id",
    "/manuscripts/:id/edit",
    "/manuscripts/:id/edit/",
];
const CUSTOMIZE_PATHS: [&str; 3] = ["/customize", "/customize/", "/customize/89"];

fn acl() -> CompiledAcl {
    let declaration = AccessControlList::from_json_str(
        r#"{
            "reader": {
                "index": "get",
                "posts": "get",
                "posts_attachments": "get"
            },
            "contributor": {
                "manuscripts": "*",
                "customize_resources": {
                    "path": "^/customize/?(\\d+)?$",
                    "methods": "get"
                }
            },
            "editor": {
                "extends": ["reader", "contributor"],
                "resources": {
                    "posts": ["edit"],
                    "posts_attachments": ["delete"]
                }
            }
        }"#,
    )
    .unwrap();
    compile(&declaration).unwrap()
}

fn assert_status(result: &CheckResult, status: CheckStatus) {
    assert_eq!(result.status, status, "unexpected result {result:?}");
}

fn assert_allowed_as(result: &CheckResult, role: &str) {
    assert_status(result, CheckStatus::Allowed);
    assert_eq!(result.role, role, "unexpected deciding role in {result:?}");
}

// ============================================================================
// reader
// ============================================================================

#[test]
fn test_reader_unknown_paths_are_not_matched() {
    let acl = acl();
    for path in [
        "/user",
        "/about",
        "/posts/:id/method/god",
        "posts/:id/attachments/:id/method/notfound",
        "/posts/:id/edit/attachments/:id",
    ] {
        assert_status(&acl.check("reader", path, "get"), CheckStatus::NotMatched);
    }
}

#[test]
fn test_reader_index() {
    let acl = acl();
    assert_status(&acl.check("reader", INDEX_PATH, "get"), CheckStatus::Allowed);
    for method in ["post", "put", "patch", "delete"] {
        assert_status(&acl.check("reader", INDEX_PATH, method), CheckStatus::Denied);
    }
}

#[test]
fn test_reader_posts() {
    let acl = acl();
    for path in POSTS_PATHS {
        assert_status(&acl.check("reader", path, "get"), CheckStatus::Allowed);
        for method in EDIT.iter().chain(["delete"].iter()) {
            assert_status(&acl.check("reader", path, method), CheckStatus::Denied);
        }
    }
}

#[test]
fn test_reader_posts_attachments() {
    let acl = acl();
    for path in POSTS_ATTACHMENTS_PATHS {
        let result = acl.check("reader", path, "get");
        assert_status(&result, CheckStatus::Allowed);
        assert_eq!(result.resource.as_deref(), Some("posts_attachments"));
        for method in EDIT.iter().chain(["delete"].iter()) {
            assert_status(&acl.check("reader", path, method), CheckStatus::Denied);
        }
    }
}

// ============================================================================
// contributor
// ============================================================================

#[test]
fn test_contributor_manuscripts() {
    let acl = acl();
    for path in MANUSCRIPTS_PATHS {
        assert_status(&acl.check("contributor", path, "get"), CheckStatus::Allowed);
        for method in EDIT.iter().chain(["delete"].iter()) {
            assert_status(&acl.check("contributor", path, method), CheckStatus::Allowed);
        }
    }
}

#[test]
fn test_contributor_custom_resource() {
    let acl = acl();
    for path in CUSTOMIZE_PATHS {
        let result = acl.check("contributor", path, "get");
        assert_status(&result, CheckStatus::Allowed);
        assert_eq!(result.resource.as_deref(), Some("customize_resources"));
    }
    assert_status(&acl.check("contributor", "/customize/abc", "get"), CheckStatus::NotMatched);
}

// ============================================================================
// editor
// ============================================================================

#[test]
fn test_editor_inherits_from_parents() {
    let acl = acl();
    assert_allowed_as(&acl.check("editor", INDEX_PATH, "get"), "reader");
    for path in POSTS_PATHS {
        assert_allowed_as(&acl.check("editor", path, "get"), "reader");
    }
    for path in POSTS_ATTACHMENTS_PATHS {
        assert_allowed_as(&acl.check("editor", path, "get"), "reader");
    }
    for path in MANUSCRIPTS_PATHS {
        assert_allowed_as(&acl.check("editor", path, "get"), "contributor");
        for method in EDIT.iter().chain(["delete"].iter()) {
            assert_allowed_as(&acl.check("editor", path, method), "contributor");
        }
    }
}

#[test]
fn test_editor_own_permissions() {
    let acl = acl();
    for path in POSTS_PATHS {
        for method in EDIT {
            assert_allowed_as(&acl.check("editor", path, method), "editor");
        }
        let result = acl.check("editor", path, "delete");
        assert_status(&result, CheckStatus::Denied);
        assert_eq!(result.role, "editor");
    }
}

#[test]
fn test_editor_nested_resources() {
    let acl = acl();
    for path in POSTS_ATTACHMENTS_PATHS {
        assert_allowed_as(&acl.check("editor", path, "delete"), "editor");
        // editor may edit posts, but attachments only grant delete
        assert_status(&acl.check("editor", path, "post"), CheckStatus::Denied);
    }
}

// ============================================================================
// Table properties
// ============================================================================

#[test]
fn test_unknown_role() {
    assert_status(&acl().check("ghost", "/", "get"), CheckStatus::RoleUndefined);
}

#[test]
fn test_independent_tables() {
    let blog = acl();
    let wiki = compile(&AccessControlList::from_json_str(r#"{ "reader": { "pages": "view" } }"#).unwrap()).unwrap();

    assert_status(&blog.check("reader", "/pages/1", "get"), CheckStatus::NotMatched);
    assert_status(&wiki.check("reader", "/pages/1", "get"), CheckStatus::Allowed);
    assert_status(&wiki.check("reader", "/posts/1", "get"), CheckStatus::NotMatched);
}

#[tokio::test]
async fn test_concurrent_checks_share_table() {
    let acl = Arc::new(acl());
    let mut handles = Vec::new();

    for i in 0..16 {
        let acl = Arc::clone(&acl);
        handles.push(tokio::spawn(async move {
            let path = format!("/posts/{i}/attachments/{i}");
            acl.check("editor", &path, "delete")
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert_allowed_as(&result, "editor");
    }
}
