//! # declarest-controllers
//!
//! The declarative controller layer: controllers declare actions (verb,
//! path, parameter bindings, middleware, permission), and a registry
//! composes each action into a full request pipeline and mounts it on a
//! host router.
//!
//! Declarations are inert data. Everything is resolved and validated at
//! registration time: binding types against the validator registry,
//! permissions against the controller hierarchy, and route paths against
//! the namespace. Invalid declarations abort registration instead of
//! surfacing per request.

pub mod action;
pub mod binder;
pub mod controller;
pub mod permission;
pub mod registrar;
pub mod registry;
pub mod types;
pub mod validator;

pub use action::{Action, ActionFn};
pub use controller::Controller;
pub use permission::{PermissionGate, ResolvedPermission, Role, RoleMap, SharedRoles};
pub use registry::ControllerRegistry;
pub use types::{Arg, Args, ParamBinding, ParamSource, PermissionDecl, TypeTag};
pub use validator::{Validator, ValidatorRegistry};
