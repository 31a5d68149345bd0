//! The controller registry: the composition root that tracks controllers,
//! owns the validator registry and the shared role map, and mounts
//! everything on a host router.

use std::sync::{Arc, RwLock};

use declarest_core::{RegisterSettings, RouteError, RouteResult};
use declarest_http::HostRouter;

use crate::controller::Controller;
use crate::permission::{role_map, ResolvedPermission, Role, SharedRoles};
use crate::registrar::register_controller;
use crate::types::TypeTag;
use crate::validator::{Validator, ValidatorRegistry};

/// Tracks declared controllers and mounts them on a host router.
///
/// The registry owns the validator registry consulted at registration time
/// and the role map shared by every permission gate it produces. Replacing
/// the role map takes effect immediately, including for routes already
/// mounted.
///
/// # Examples
///
/// ```
/// use declarest_controllers::{Action, Controller, ControllerRegistry};
/// use declarest_core::RegisterSettings;
/// use declarest_http::MemoryRouter;
///
/// let mut registry = ControllerRegistry::new();
/// registry
///     .add(Controller::new("ping").action(
///         Action::get("now").handler(|_| async { Ok(None) }),
///     ))
///     .unwrap();
///
/// let mut router = MemoryRouter::new();
/// registry.register_all(&mut router, &RegisterSettings::new()).unwrap();
/// assert_eq!(router.route_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    controllers: Vec<Arc<Controller>>,
    validators: ValidatorRegistry,
    roles: SharedRoles,
}

impl ControllerRegistry {
    /// Creates an empty registry with the built-in validators.
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            validators: ValidatorRegistry::new(),
            roles: Arc::new(RwLock::new(None)),
        }
    }

    /// Tracks a controller.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateController`] when a controller with
    /// the same mount path is already tracked.
    pub fn add(&mut self, controller: Controller) -> RouteResult<()> {
        if self
            .controllers
            .iter()
            .any(|tracked| tracked.name() == controller.name())
        {
            return Err(RouteError::DuplicateController(controller.name().to_string()));
        }
        self.controllers.push(Arc::new(controller));
        Ok(())
    }

    /// Registers a validator for a custom type.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateType`] when the type already has a
    /// validator.
    pub fn add_validator(&mut self, tag: TypeTag, validator: Validator) -> RouteResult<()> {
        self.validators.add(tag, validator)
    }

    /// Replaces the role map wholesale. Takes effect immediately for every
    /// gate this registry has produced.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Internal`] when the shared map is poisoned.
    pub fn set_roles(&self, roles: Vec<Role>) -> RouteResult<()> {
        let map = role_map(&roles);
        let mut guard = self
            .roles
            .write()
            .map_err(|_| RouteError::Internal("role map lock poisoned".into()))?;
        *guard = Some(map);
        Ok(())
    }

    /// Mounts one tracked controller on the router, by mount path.
    ///
    /// The divergence and implicit-access checks still run over every
    /// tracked controller, so a partial registration cannot dodge them.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Configuration`] when no controller is tracked
    /// at the given path, plus everything [`Self::register_all`] returns.
    pub fn register(
        &self,
        name: &str,
        router: &mut dyn HostRouter,
        settings: &RegisterSettings,
    ) -> RouteResult<()> {
        self.check_divergence()?;
        self.check_implicit_access(settings)?;
        let name = if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/{name}")
        };
        let controller = self
            .controllers
            .iter()
            .find(|tracked| tracked.name() == name)
            .ok_or_else(|| {
                RouteError::Configuration(format!("no controller tracked at {name}"))
            })?;
        register_controller(controller, router, settings, &self.validators, &self.roles)
    }

    /// Mounts every tracked controller on the router.
    ///
    /// # Errors
    ///
    /// Fails before mounting anything when two actions at the same path
    /// disagree on public-vs-protected, or when an undeclared action exists
    /// alongside declared permissions without the implicit-access opt-in.
    /// Invalid action declarations fail as they are reached.
    pub fn register_all(
        &self,
        router: &mut dyn HostRouter,
        settings: &RegisterSettings,
    ) -> RouteResult<()> {
        self.check_divergence()?;
        self.check_implicit_access(settings)?;
        for controller in &self.controllers {
            register_controller(controller, router, settings, &self.validators, &self.roles)?;
        }
        Ok(())
    }

    /// Returns every named permission required by tracked controllers, in
    /// declaration order, deduplicated. Namespace-independent.
    pub fn all_permissions(&self) -> Vec<String> {
        let mut names = Vec::new();
        for controller in &self.controllers {
            for name in controller.permissions() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Returns every route explicitly opened to anonymous callers, as
    /// namespace-independent paths.
    pub fn all_public_routes(&self) -> Vec<String> {
        let mut routes = Vec::new();
        for controller in &self.controllers {
            for route in controller.public_routes() {
                if !routes.contains(&route) {
                    routes.push(route);
                }
            }
        }
        routes
    }

    fn resolved_routes(&self) -> Vec<(String, ResolvedPermission)> {
        let mut routes = Vec::new();
        for controller in &self.controllers {
            for action in controller.actions() {
                let path = format!("{}{}", controller.name(), action.path());
                routes.push((path, controller.resolve_action(action)));
            }
        }
        routes
    }

    fn check_divergence(&self) -> RouteResult<()> {
        let routes = self.resolved_routes();
        for (i, (path, resolved)) in routes.iter().enumerate() {
            for (other_path, other_resolved) in &routes[i + 1..] {
                if path == other_path && is_open(resolved) != is_open(other_resolved) {
                    return Err(RouteError::DivergentPermission { path: path.clone() });
                }
            }
        }
        Ok(())
    }

    fn check_implicit_access(&self, settings: &RegisterSettings) -> RouteResult<()> {
        if settings.implicit_access {
            return Ok(());
        }
        let routes = self.resolved_routes();
        let any_declared = routes
            .iter()
            .any(|(_, resolved)| *resolved != ResolvedPermission::Open);
        if !any_declared {
            return Ok(());
        }
        if let Some((path, _)) = routes
            .iter()
            .find(|(_, resolved)| *resolved == ResolvedPermission::Open)
        {
            return Err(RouteError::ImplicitAccess(format!(
                "route {path} declares no permission while others do"
            )));
        }
        Ok(())
    }
}

const fn is_open(resolved: &ResolvedPermission) -> bool {
    matches!(
        resolved,
        ResolvedPermission::Open | ResolvedPermission::Public
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use declarest_http::MemoryRouter;

    fn noop_action(name: &str) -> Action {
        Action::get(name).handler(|_| async { Ok(None) })
    }

    #[test]
    fn test_duplicate_controller_rejected() {
        let mut registry = ControllerRegistry::new();
        registry.add(Controller::new("users")).unwrap();
        let err = registry.add(Controller::new("/users")).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateController(name) if name == "/users"));
    }

    #[test]
    fn test_all_permissions_and_public_routes() {
        let mut registry = ControllerRegistry::new();
        registry
            .add(
                Controller::new("a")
                    .permission("p1")
                    .action(noop_action("x"))
                    .action(noop_action("y").allow_anonymous()),
            )
            .unwrap();
        registry
            .add(
                Controller::new("b")
                    .action(noop_action("x").permission("p2"))
                    .action(noop_action("y").permission("p1")),
            )
            .unwrap();

        assert_eq!(registry.all_permissions(), vec!["p1", "p2"]);
        assert_eq!(registry.all_public_routes(), vec!["/a/y"]);
    }

    #[test]
    fn test_divergent_permissions_rejected() {
        let mut registry = ControllerRegistry::new();
        registry
            .add(
                Controller::new("c")
                    .action(noop_action("a").at("/shared").allow_anonymous())
                    .action(
                        Action::post("b")
                            .at("/shared")
                            .permission("p")
                            .handler(|_| async { Ok(None) }),
                    ),
            )
            .unwrap();

        let mut router = MemoryRouter::new();
        let err = registry
            .register_all(&mut router, &RegisterSettings::new())
            .unwrap_err();
        assert!(matches!(err, RouteError::DivergentPermission { path } if path == "/c/shared"));
        assert_eq!(router.route_count(), 0);
    }

    #[test]
    fn test_two_named_permissions_at_same_path_allowed() {
        let mut registry = ControllerRegistry::new();
        registry
            .add(
                Controller::new("c")
                    .action(
                        Action::get("a")
                            .at("/shared")
                            .permission("read")
                            .handler(|_| async { Ok(None) }),
                    )
                    .action(
                        Action::post("b")
                            .at("/shared")
                            .permission("write")
                            .handler(|_| async { Ok(None) }),
                    ),
            )
            .unwrap();

        let mut router = MemoryRouter::new();
        registry
            .register_all(&mut router, &RegisterSettings::new())
            .unwrap();
        assert_eq!(router.route_count(), 2);
    }

    #[test]
    fn test_implicit_access_guard() {
        let mut registry = ControllerRegistry::new();
        registry
            .add(
                Controller::new("c")
                    .action(noop_action("open"))
                    .action(noop_action("guarded").permission("p")),
            )
            .unwrap();

        let mut router = MemoryRouter::new();
        let err = registry
            .register_all(&mut router, &RegisterSettings::new())
            .unwrap_err();
        assert!(matches!(err, RouteError::ImplicitAccess(_)));

        // Opting in mounts both.
        let mut router = MemoryRouter::new();
        registry
            .register_all(&mut router, &RegisterSettings::new().implicit_access(true))
            .unwrap();
        assert_eq!(router.route_count(), 2);
    }

    #[test]
    fn test_all_open_needs_no_opt_in() {
        let mut registry = ControllerRegistry::new();
        registry
            .add(Controller::new("c").action(noop_action("a")).action(noop_action("b")))
            .unwrap();

        let mut router = MemoryRouter::new();
        registry
            .register_all(&mut router, &RegisterSettings::new())
            .unwrap();
        assert_eq!(router.route_count(), 2);
    }

    #[test]
    fn test_custom_validator_flows_to_registration() {
        let mut registry = ControllerRegistry::new();
        registry
            .add_validator(
                TypeTag::Custom("slug".into()),
                Validator::new(
                    |value| value.as_str().is_some_and(|s| !s.is_empty()),
                    |raw| {
                        (!raw.is_empty()).then(|| serde_json::Value::String(raw.to_string()))
                    },
                ),
            )
            .unwrap();
        registry
            .add(
                Controller::new("c").action(
                    Action::get("x")
                        .query(0, "slug", TypeTag::Custom("slug".into()))
                        .handler(|_| async { Ok(None) }),
                ),
            )
            .unwrap();

        let mut router = MemoryRouter::new();
        registry
            .register_all(&mut router, &RegisterSettings::new())
            .unwrap();
        assert_eq!(router.route_count(), 1);
    }

    #[test]
    fn test_register_single_controller() {
        let mut registry = ControllerRegistry::new();
        registry.add(Controller::new("a").action(noop_action("x"))).unwrap();
        registry.add(Controller::new("b").action(noop_action("y"))).unwrap();

        let mut router = MemoryRouter::new();
        registry
            .register("a", &mut router, &RegisterSettings::new())
            .unwrap();
        assert_eq!(router.route_count(), 1);

        let err = registry
            .register("missing", &mut router, &RegisterSettings::new())
            .unwrap_err();
        assert!(matches!(err, RouteError::Configuration(_)));
    }

    #[test]
    fn test_set_roles_replaces_wholesale() {
        let registry = ControllerRegistry::new();
        registry
            .set_roles(vec![Role::new("admin", vec!["p".into()])])
            .unwrap();
        registry
            .set_roles(vec![Role::new("viewer", vec!["q".into()])])
            .unwrap();

        let guard = registry.roles.read().unwrap();
        let map = guard.as_ref().unwrap();
        assert!(!map.contains_key("admin"));
        assert!(map["viewer"].contains("q"));
    }
}
