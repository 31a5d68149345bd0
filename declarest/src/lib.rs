//! # declarest
//!
//! Declarative controller routing and request binding for Rust web
//! services.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient
//! access. Depend on `declarest` to get the whole stack, or on individual
//! crates for finer-grained control.
//!
//! # Examples
//!
//! ```
//! use declarest::controllers::{Action, Controller, ControllerRegistry, TypeTag};
//! use declarest::core::RegisterSettings;
//! use declarest::http::MemoryRouter;
//!
//! # fn main() -> Result<(), declarest::core::RouteError> {
//! let mut registry = ControllerRegistry::new();
//! registry.add(
//!     Controller::new("users").action(
//!         Action::get("list")
//!             .query_optional(0, "page", TypeTag::Number)
//!             .handler(|args| async move {
//!                 let page = args.number(0).unwrap_or(1);
//!                 Ok(Some(serde_json::json!({ "page": page, "users": [] })))
//!             }),
//!     ),
//! )?;
//!
//! let mut router = MemoryRouter::new();
//! registry.register_all(&mut router, &RegisterSettings::new())?;
//! # Ok(())
//! # }
//! ```

/// Core types: error taxonomy, registration settings, logging setup.
pub use declarest_core as core;

/// HTTP context: request/response types, identity contract, host router,
/// axum bridge.
pub use declarest_http as http;

/// The controller layer: actions, bindings, validators, permissions, and
/// the registry.
pub use declarest_controllers as controllers;
