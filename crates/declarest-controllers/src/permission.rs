//! Permission resolution and the per-route gate.
//!
//! Permissions resolve at registration time: the action's declaration wins,
//! an action without one inherits the controller's, and derived names are
//! computed from the mount location. At request time the gate checks the
//! resolved requirement against the caller identity, consulting the shared
//! role map first when one is configured.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use declarest_core::{RouteError, RouteResult};
use declarest_http::Request;

use crate::types::PermissionDecl;

/// A named role granting a set of permissions.
#[derive(Debug, Clone)]
pub struct Role {
    /// The role name, as carried by identities.
    pub name: String,
    /// The permission names this role grants.
    pub permissions: Vec<String>,
}

impl Role {
    /// Creates a role.
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            permissions,
        }
    }
}

/// Role name to granted permission set.
pub type RoleMap = HashMap<String, HashSet<String>>;

/// The role map shared by every gate a registry produces. `None` means no
/// map is configured and identities are asked directly.
pub type SharedRoles = Arc<RwLock<Option<RoleMap>>>;

/// Builds a [`RoleMap`] from a role list. Later duplicates extend the
/// earlier set.
pub fn role_map(roles: &[Role]) -> RoleMap {
    let mut map = RoleMap::new();
    for role in roles {
        map.entry(role.name.clone())
            .or_default()
            .extend(role.permissions.iter().cloned());
    }
    map
}

/// A permission requirement after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPermission {
    /// No declaration anywhere. Open, but not advertised as public.
    Open,
    /// Explicitly open and advertised as public.
    Public,
    /// Any attached identity suffices.
    Authenticated,
    /// The named permission is required.
    Named(String),
}

/// Derives the default permission name for an action mounted at
/// `base` + `path`.
///
/// The name is `base:path` with every slash removed. When the path is
/// empty, the controller root, or starts with a dynamic segment, the member
/// name is used instead.
pub fn derived_name(base: &str, path: &str, member_name: &str) -> String {
    let base = base.trim_start_matches('/');
    if path.is_empty() || path == "/" || path.starts_with("/:") {
        format!("{base}:{member_name}")
    } else {
        format!("{}:{}", base, path.replace('/', ""))
    }
}

/// Resolves an action's permission requirement.
pub fn resolve(
    action_decl: &PermissionDecl,
    class_decl: &PermissionDecl,
    base: &str,
    path: &str,
    member_name: &str,
) -> ResolvedPermission {
    let effective = if *action_decl == PermissionDecl::Inherit {
        class_decl
    } else {
        action_decl
    };
    match effective {
        PermissionDecl::Inherit => ResolvedPermission::Open,
        PermissionDecl::Public => ResolvedPermission::Public,
        PermissionDecl::Authenticated => ResolvedPermission::Authenticated,
        PermissionDecl::Named(name) => ResolvedPermission::Named(name.clone()),
        PermissionDecl::Derived => {
            ResolvedPermission::Named(derived_name(base, path, member_name))
        }
    }
}

/// The per-route permission gate, checked before parameter binding.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    resolved: ResolvedPermission,
    roles: SharedRoles,
}

impl PermissionGate {
    /// Creates a gate for a resolved requirement.
    pub fn new(resolved: ResolvedPermission, roles: SharedRoles) -> Self {
        Self { resolved, roles }
    }

    /// Returns the resolved requirement.
    pub const fn resolved(&self) -> &ResolvedPermission {
        &self.resolved
    }

    /// Checks the request's identity against the requirement.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Unauthenticated`] when an identity is required
    /// but absent, and [`RouteError::Unauthorized`] when the identity lacks
    /// the named permission.
    pub async fn check(&self, request: &Request) -> RouteResult<()> {
        match &self.resolved {
            ResolvedPermission::Open | ResolvedPermission::Public => Ok(()),
            ResolvedPermission::Authenticated => {
                if request.identity().is_some() {
                    Ok(())
                } else {
                    Err(RouteError::Unauthenticated)
                }
            }
            ResolvedPermission::Named(name) => {
                let Some(identity) = request.identity() else {
                    return Err(RouteError::Unauthenticated);
                };

                // Role map verdict is computed with the lock held and the
                // direct identity query awaited without it.
                let role_verdict = {
                    let guard = self
                        .roles
                        .read()
                        .map_err(|_| RouteError::Internal("role map lock poisoned".into()))?;
                    guard.as_ref().map(|map| {
                        identity.roles().is_some_and(|roles| {
                            roles
                                .iter()
                                .any(|role| map.get(role).is_some_and(|set| set.contains(name)))
                        })
                    })
                };

                let granted = match role_verdict {
                    Some(verdict) => verdict,
                    None => identity.has_permission(name).await == Some(true),
                };
                if granted {
                    Ok(())
                } else {
                    Err(RouteError::Unauthorized)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarest_http::SimpleIdentity;

    fn shared(map: Option<RoleMap>) -> SharedRoles {
        Arc::new(RwLock::new(map))
    }

    fn with_identity(identity: SimpleIdentity) -> Request {
        Request::builder().user(Arc::new(identity)).build()
    }

    // ── name derivation ─────────────────────────────────────────────

    #[test]
    fn test_derived_name_strips_slashes() {
        assert_eq!(derived_name("/perm", "/test1-a", "test1a"), "perm:test1-a");
        assert_eq!(derived_name("/perm", "/a/b", "m"), "perm:ab");
    }

    #[test]
    fn test_derived_name_falls_back_to_member() {
        assert_eq!(derived_name("/perm", "", "index"), "perm:index");
        assert_eq!(derived_name("/perm", "/", "index"), "perm:index");
        assert_eq!(derived_name("/perm", "/:id", "fetch"), "perm:fetch");
    }

    // ── resolution ──────────────────────────────────────────────────

    #[test]
    fn test_resolve_action_wins_over_class() {
        let resolved = resolve(
            &PermissionDecl::Public,
            &PermissionDecl::Named("p".into()),
            "/c",
            "/x",
            "x",
        );
        assert_eq!(resolved, ResolvedPermission::Public);
    }

    #[test]
    fn test_resolve_inherits_class() {
        let resolved = resolve(
            &PermissionDecl::Inherit,
            &PermissionDecl::Named("p".into()),
            "/c",
            "/x",
            "x",
        );
        assert_eq!(resolved, ResolvedPermission::Named("p".into()));
    }

    #[test]
    fn test_resolve_nothing_declared_is_open() {
        let resolved = resolve(
            &PermissionDecl::Inherit,
            &PermissionDecl::Inherit,
            "/c",
            "/x",
            "x",
        );
        assert_eq!(resolved, ResolvedPermission::Open);
    }

    #[test]
    fn test_resolve_derived() {
        let resolved = resolve(
            &PermissionDecl::Derived,
            &PermissionDecl::Inherit,
            "/users",
            "/list",
            "list",
        );
        assert_eq!(resolved, ResolvedPermission::Named("users:list".into()));
    }

    // ── gate ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_gate_open_allows_anonymous() {
        let gate = PermissionGate::new(ResolvedPermission::Open, shared(None));
        assert!(gate.check(&Request::builder().build()).await.is_ok());
    }

    #[tokio::test]
    async fn test_gate_authenticated_requires_identity() {
        let gate = PermissionGate::new(ResolvedPermission::Authenticated, shared(None));
        let denied = gate.check(&Request::builder().build()).await;
        assert!(matches!(denied, Err(RouteError::Unauthenticated)));

        let granted = gate.check(&with_identity(SimpleIdentity::new())).await;
        assert!(granted.is_ok());
    }

    #[tokio::test]
    async fn test_gate_named_asks_identity_directly() {
        let gate = PermissionGate::new(ResolvedPermission::Named("p".into()), shared(None));

        let granted = gate
            .check(&with_identity(SimpleIdentity::new().with_permission("p")))
            .await;
        assert!(granted.is_ok());

        let denied = gate.check(&with_identity(SimpleIdentity::new())).await;
        assert!(matches!(denied, Err(RouteError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_gate_named_no_identity_is_unauthenticated() {
        let gate = PermissionGate::new(ResolvedPermission::Named("p".into()), shared(None));
        let denied = gate.check(&Request::builder().build()).await;
        assert!(matches!(denied, Err(RouteError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_gate_role_map_overrides_identity_query() {
        let map = role_map(&[Role::new("admin", vec!["p".into()])]);
        let gate = PermissionGate::new(ResolvedPermission::Named("p".into()), shared(Some(map)));

        // Granted through the role even though the identity itself does not
        // carry the permission.
        let admin = SimpleIdentity::new().with_roles(vec!["admin".into()]);
        assert!(gate.check(&with_identity(admin)).await.is_ok());

        // Denied despite the direct permission: the role map is in charge.
        let direct = SimpleIdentity::new().with_permission("p");
        let denied = gate.check(&with_identity(direct)).await;
        assert!(matches!(denied, Err(RouteError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_gate_role_map_requires_role_list() {
        let map = role_map(&[Role::new("admin", vec!["p".into()])]);
        let gate = PermissionGate::new(ResolvedPermission::Named("p".into()), shared(Some(map)));

        let roleless = SimpleIdentity::new();
        let denied = gate.check(&with_identity(roleless)).await;
        assert!(matches!(denied, Err(RouteError::Unauthorized)));
    }

    #[test]
    fn test_role_map_merges_duplicates() {
        let map = role_map(&[
            Role::new("a", vec!["x".into()]),
            Role::new("a", vec!["y".into()]),
        ]);
        assert!(map["a"].contains("x"));
        assert!(map["a"].contains("y"));
    }
}
