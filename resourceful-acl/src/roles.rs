//! # Roles
//!
//! Compiles an [`AccessControlList`] into the immutable table the checker
//! reads. Each role becomes a list of path matchers sorted by ascending
//! priority, so nested resources sit at the end and are tried first.
//!
//! Compilation rejects inheritance cycles (`a extends b`, `b extends a`)
//! and ownership cycles between explicit `belongs_to` links. Everything
//! else is tolerated: unknown parents and owners are logged and simply
//! never grant anything.

use std::collections::{HashMap, HashSet};

use crate::declaration::{AccessControlList, PathSource, ResourceDecl, RoleDecl};
use crate::error::{AclError, AclResult};
use crate::methods::{normalize, MethodSet};
use crate::resources::{compile_path, PathPattern};

/// A resource with its matcher, permitted methods and owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledResource {
    /// Resource name as declared.
    pub name: String,
    /// Matcher for request paths.
    pub pattern: PathPattern,
    /// Permitted methods.
    pub methods: MethodSet,
    /// Owning resource, gating nested access.
    pub belongs_to: Option<String>,
    /// Specificity; higher is tried first.
    pub priority: u32,
}

/// A role ready for checking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledRole {
    /// Parent roles, in declaration order.
    pub parents: Vec<String>,
    /// Own resources, ascending by priority.
    pub resources: Vec<CompiledResource>,
}

impl CompiledRole {
    /// Find an own resource by name.
    pub fn resource(&self, name: &str) -> Option<&CompiledResource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

/// Compiled access control list.
///
/// Immutable once built and safe to share between threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledAcl {
    roles: HashMap<String, CompiledRole>,
}

impl CompiledAcl {
    /// Get a compiled role.
    pub fn role(&self, name: &str) -> Option<&CompiledRole> {
        self.roles.get(name)
    }

    /// Check if a role is defined.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Iterate role names, in no particular order.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Check if the table has no roles.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl TryFrom<&AccessControlList> for CompiledAcl {
    type Error = AclError;

    fn try_from(acl: &AccessControlList) -> AclResult<Self> {
        compile(acl)
    }
}

/// Compile a declarative table.
///
/// # Errors
///
/// - [`AclError::CyclicRoleInheritance`] when `extends` links loop
/// - [`AclError::CyclicResourceOwnership`] when `belongs_to` links loop
/// - [`AclError::InvalidPattern`] when an explicit path does not compile
///
/// # Example
///
/// ```
/// use resourceful_acl::{compile, AccessControlList, RoleDecl};
///
/// let acl = AccessControlList::new()
///     .role("reader", RoleDecl::new().resource("posts_attachments", "get").resource("posts", "get"));
/// let compiled = compile(&acl).unwrap();
///
/// let names: Vec<&str> = compiled.role("reader").unwrap().resources.iter().map(|r| r.name.as_str()).collect();
/// assert_eq!(names, vec!["posts", "posts_attachments"]);
/// ```
pub fn compile(acl: &AccessControlList) -> AclResult<CompiledAcl> {
    let mut roles = HashMap::with_capacity(acl.len());
    for (name, decl) in acl.roles() {
        roles.insert(name.to_string(), compile_role(name, decl)?);
    }

    let order: Vec<&str> = acl.roles().map(|(name, _)| name).collect();
    check_role_cycles(&order, &roles)?;

    for (name, role) in &roles {
        for parent in role.parents.iter().filter(|p| !roles.contains_key(p.as_str())) {
            tracing::warn!(role = %name, parent = %parent, "Role extends an undefined role");
        }
    }

    tracing::info!(
        roles = roles.len(),
        resources = roles.values().map(|r| r.resources.len()).sum::<usize>(),
        "Compiled access control list"
    );

    Ok(CompiledAcl { roles })
}

fn compile_role(role: &str, decl: &RoleDecl) -> AclResult<CompiledRole> {
    let mut resources = decl
        .resources
        .iter()
        .map(|(name, resource)| compile_resource(role, name, resource))
        .collect::<AclResult<Vec<_>>>()?;

    // stable: equal priorities keep declaration order
    resources.sort_by_key(|r| r.priority);

    let compiled = CompiledRole {
        parents: decl.extends.clone(),
        resources,
    };
    check_ownership(role, &compiled)?;
    Ok(compiled)
}

fn compile_resource(role: &str, name: &str, decl: &ResourceDecl) -> AclResult<CompiledResource> {
    let (pattern, belongs_to, priority) = match &decl.path {
        Some(PathSource::Pattern(pattern)) => (pattern.clone(), decl.belongs_to.clone(), decl.priority.unwrap_or(1)),
        Some(PathSource::Source(source)) => {
            let pattern = PathPattern::new(source).map_err(|source| AclError::InvalidPattern {
                resource: name.to_string(),
                source,
            })?;
            (pattern, decl.belongs_to.clone(), decl.priority.unwrap_or(1))
        }
        None => {
            let derived = compile_path(name).map_err(|source| AclError::InvalidPattern {
                resource: name.to_string(),
                source,
            })?;
            (
                derived.pattern,
                decl.belongs_to.clone().or(derived.belongs_to),
                decl.priority.unwrap_or(derived.priority),
            )
        }
    };

    let methods = normalize(&decl.methods);
    if methods == MethodSet::Nothing {
        tracing::warn!(role, resource = name, "Resource grants no methods; every request to it is denied");
    }

    Ok(CompiledResource {
        name: name.to_string(),
        pattern,
        methods,
        belongs_to,
        priority: priority.max(1),
    })
}

/// Follow `belongs_to` links from every resource and fail on a loop.
fn check_ownership(role: &str, compiled: &CompiledRole) -> AclResult<()> {
    for resource in &compiled.resources {
        let mut chain = vec![resource.name.as_str()];
        let mut current = resource;
        while let Some(owner) = current.belongs_to.as_deref() {
            if chain.contains(&owner) {
                chain.push(owner);
                return Err(AclError::CyclicResourceOwnership {
                    role: role.to_string(),
                    chain: chain.join(" -> "),
                });
            }
            chain.push(owner);
            match compiled.resource(owner) {
                Some(next) => current = next,
                None => {
                    tracing::warn!(
                        role,
                        resource = %resource.name,
                        owner,
                        "Owner resource is not declared by the role; nested requests are denied"
                    );
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Check for cycles in role inheritance using DFS.
///
/// The walk keeps its own stack so long `extends` chains cannot overflow
/// the thread stack.
fn check_role_cycles<'a>(order: &[&'a str], roles: &'a HashMap<String, CompiledRole>) -> AclResult<()> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut in_stack: HashSet<&str> = HashSet::new();

    for &start in order {
        if !visited.insert(start) {
            continue;
        }
        in_stack.insert(start);
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let name = frame.0;
            let parents = roles.get(name).map(|r| r.parents.as_slice()).unwrap_or_default();
            match parents.get(frame.1) {
                Some(parent) => {
                    frame.1 += 1;
                    if in_stack.contains(parent.as_str()) {
                        return Err(AclError::CyclicRoleInheritance(format!("{name} -> {parent}")));
                    }
                    if visited.insert(parent.as_str()) {
                        in_stack.insert(parent.as_str());
                        stack.push((parent.as_str(), 0));
                    }
                }
                None => {
                    in_stack.remove(name);
                    stack.pop();
                }
            }
        }
    }
    Ok(())
}
