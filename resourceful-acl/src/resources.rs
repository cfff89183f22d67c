//! # Resources
//!
//! Translates resource names into RESTful path patterns.
//!
//! A plain name such as `posts` covers the collection, member and
//! member-action paths:
//!
//! ```text
//! /posts
//! /posts/:id
//! /posts/:id/archive
//! ```
//!
//! Underscores denote nesting. `posts_attachments` covers the surface of
//! `attachments` under a post and records `posts` as its owner:
//!
//! ```text
//! /posts/:id/attachments
//! /posts/:id/attachments/:id
//! /posts/:id/attachments/:id/download
//! ```

use regex::{Regex, RegexBuilder};
use std::fmt;

/// Resource name reserved for the site root (`/`).
pub const INDEX_RESOURCE: &str = "index";

/// Separator between nested resource segments.
pub const NESTING_SEPARATOR: char = '_';

/// An optional path variable, itself optionally slash-terminated.
const PATH_VARIABLE: &str = "([^/]+?/?)?";

/// An optional trailing slash.
const SLASH: &str = "/?";

/// Case-insensitive, fully anchored path matcher.
///
/// Two patterns are equal when their sources are equal.
#[derive(Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Compile a pattern source case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the regex error when `source` is not a valid pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    /// Wrap a pre-built regex as-is, keeping its own flags.
    pub fn from_regex(regex: Regex) -> Self {
        Self { regex }
    }

    /// Check if a request path matches.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Get the pattern source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for PathPattern {}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.as_str()).finish()
    }
}

impl From<Regex> for PathPattern {
    fn from(regex: Regex) -> Self {
        Self::from_regex(regex)
    }
}

/// Pattern, owner and priority derived from a resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    /// Pattern matching the resource's request paths.
    pub pattern: PathPattern,
    /// Owning resource for nested names.
    pub belongs_to: Option<String>,
    /// Number of nesting segments; nested resources are tried first.
    pub priority: u32,
}

/// Build the pattern source for a resource name.
///
/// # Example
///
/// ```
/// use resourceful_acl::resources::pattern_source;
///
/// assert_eq!(pattern_source("index"), "^/$");
/// assert_eq!(pattern_source("posts"), "^/posts/?([^/]+?/?)?([^/]+?/?)?$");
/// ```
pub fn pattern_source(name: &str) -> String {
    if name == INDEX_RESOURCE {
        return "^/$".to_string();
    }

    let mut source = String::from("^");
    for segment in name.split(NESTING_SEPARATOR) {
        source.push('/');
        source.push_str(&regex::escape(segment));
        source.push_str(SLASH);
        source.push_str(PATH_VARIABLE);
    }
    // room for a member action on the innermost segment
    source.push_str(PATH_VARIABLE);
    source.push('$');
    source
}

/// Derive the pattern, owner and priority of a resource name.
///
/// # Errors
///
/// Returns the regex error when the generated pattern cannot be built,
/// e.g. a name long enough to exceed the regex size limit.
///
/// # Example
///
/// ```
/// use resourceful_acl::resources::compile_path;
///
/// let path = compile_path("posts_attachments").unwrap();
/// assert!(path.pattern.matches("/posts/42/attachments/7/download"));
/// assert_eq!(path.belongs_to.as_deref(), Some("posts"));
/// assert_eq!(path.priority, 2);
/// ```
pub fn compile_path(name: &str) -> Result<ResourcePath, regex::Error> {
    let pattern = PathPattern::new(&pattern_source(name))?;

    if name == INDEX_RESOURCE {
        return Ok(ResourcePath {
            pattern,
            belongs_to: None,
            priority: 1,
        });
    }

    let (belongs_to, priority) = match name.rsplit_once(NESTING_SEPARATOR) {
        Some((owner, _)) => (Some(owner.to_string()), segment_count(name)),
        None => (None, 1),
    };

    Ok(ResourcePath {
        pattern,
        belongs_to,
        priority,
    })
}

/// Render the canonical member path of a resource name.
///
/// # Example
///
/// ```
/// use resourceful_acl::resources::member_path;
///
/// assert_eq!(member_path("posts_attachments"), "/posts/:id/attachments/:id");
/// ```
pub fn member_path(name: &str) -> String {
    name.split(NESTING_SEPARATOR)
        .map(|segment| format!("/{segment}/:id"))
        .collect()
}

fn segment_count(name: &str) -> u32 {
    u32::try_from(name.split(NESTING_SEPARATOR).count()).unwrap_or(u32::MAX)
}
