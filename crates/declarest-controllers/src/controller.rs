//! Controller declarations: a named group of actions mounted under one
//! base path, with an optional class-level permission declaration that
//! actions inherit.

use crate::action::Action;
use crate::permission::{resolve, ResolvedPermission};
use crate::types::PermissionDecl;

/// A declared controller.
///
/// # Examples
///
/// ```
/// use declarest_controllers::{Action, Controller};
///
/// let controller = Controller::new("users")
///     .authorize()
///     .action(Action::get("list").handler(|_| async { Ok(None) }));
/// assert_eq!(controller.name(), "/users");
/// ```
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    permission: PermissionDecl,
    actions: Vec<Action>,
}

impl Controller {
    /// Declares a controller mounted at `name`. A leading `/` is added when
    /// missing.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.starts_with('/') {
            name
        } else {
            format!("/{name}")
        };
        Self {
            name,
            permission: PermissionDecl::Inherit,
            actions: Vec::new(),
        }
    }

    /// Requires a specific named permission for every inheriting action.
    #[must_use]
    pub fn permission(mut self, name: impl Into<String>) -> Self {
        self.permission = PermissionDecl::Named(name.into());
        self
    }

    /// Requires a derived permission for every inheriting action.
    #[must_use]
    pub fn permission_default(mut self) -> Self {
        self.permission = PermissionDecl::Derived;
        self
    }

    /// Requires any attached identity for every inheriting action.
    #[must_use]
    pub fn authorize(mut self) -> Self {
        self.permission = PermissionDecl::Authenticated;
        self
    }

    /// Opens every inheriting action to anonymous callers.
    #[must_use]
    pub fn allow_anonymous(mut self) -> Self {
        self.permission = PermissionDecl::Public;
        self
    }

    /// Adds an action.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Returns the mount path, with its leading `/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the class-level permission declaration.
    pub const fn permission_decl(&self) -> &PermissionDecl {
        &self.permission
    }

    /// Returns the declared actions, in declaration order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Resolves the permission requirement of one action.
    pub fn resolve_action(&self, action: &Action) -> ResolvedPermission {
        resolve(
            action.permission_decl(),
            &self.permission,
            &self.name,
            action.path(),
            action.member_name(),
        )
    }

    /// Returns the named permissions this controller requires, in action
    /// order, deduplicated.
    pub fn permissions(&self) -> Vec<String> {
        let mut names = Vec::new();
        for action in &self.actions {
            if let ResolvedPermission::Named(name) = self.resolve_action(action) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Returns the routes explicitly opened to anonymous callers, as
    /// controller-relative full paths.
    pub fn public_routes(&self) -> Vec<String> {
        let mut routes = Vec::new();
        for action in &self.actions {
            if self.resolve_action(action) == ResolvedPermission::Public {
                let route = format!("{}{}", self.name, action.path());
                if !routes.contains(&route) {
                    routes.push(route);
                }
            }
        }
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalized() {
        assert_eq!(Controller::new("users").name(), "/users");
        assert_eq!(Controller::new("/users").name(), "/users");
    }

    #[test]
    fn test_permissions_inherit_and_dedup() {
        let controller = Controller::new("perm")
            .permission("shared")
            .action(Action::get("a").handler(|_| async { Ok(None) }))
            .action(Action::get("b").handler(|_| async { Ok(None) }))
            .action(
                Action::get("c")
                    .permission("special")
                    .handler(|_| async { Ok(None) }),
            );
        assert_eq!(controller.permissions(), vec!["shared", "special"]);
    }

    #[test]
    fn test_permissions_derived_from_mount() {
        let controller = Controller::new("perm")
            .permission_default()
            .action(Action::get("test1-a").handler(|_| async { Ok(None) }));
        assert_eq!(controller.permissions(), vec!["perm:test1-a"]);
    }

    #[test]
    fn test_public_routes() {
        let controller = Controller::new("perm")
            .permission("p")
            .action(
                Action::get("open")
                    .allow_anonymous()
                    .handler(|_| async { Ok(None) }),
            )
            .action(Action::get("guarded").handler(|_| async { Ok(None) }));
        assert_eq!(controller.public_routes(), vec!["/perm/open"]);
        assert_eq!(controller.permissions(), vec!["p"]);
    }

    #[test]
    fn test_open_actions_not_listed() {
        let controller =
            Controller::new("free").action(Action::get("x").handler(|_| async { Ok(None) }));
        assert!(controller.permissions().is_empty());
        assert!(controller.public_routes().is_empty());
    }
}
