//! # declarest-core
//!
//! Core types for the declarest routing layer. This crate has no HTTP
//! dependencies and provides the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - The [`RouteError`] taxonomy and result alias
//! - [`settings`] - Per-registration settings and logger injection points
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;

// Re-export the most commonly used types at the crate root.
pub use error::{RouteError, RouteResult};
pub use settings::{DebugLogger, ErrorLogger, RegisterSettings};
