//! Error types for the declarest routing layer.
//!
//! [`RouteError`] covers the full taxonomy: configuration problems that must
//! fail application startup, request-scoped binding and authorization
//! failures that map to 4xx responses, and unclassified business errors.
//! Each variant maps to an HTTP status code via [`RouteError::status_code`].

use serde_json::{json, Value};
use thiserror::Error;

/// The primary error type for the declarest routing layer.
///
/// Startup-time variants (`Configuration`, `DuplicateController`,
/// `DivergentPermission`, `ImplicitAccess`, `DuplicateType`, `UnknownType`)
/// are raised while building or registering controllers and are intended to
/// abort startup. The remaining variants are request-scoped and are caught
/// exactly once, at the composed-handler boundary.
#[derive(Error, Debug)]
pub enum RouteError {
    // ── Startup / registration errors ────────────────────────────────

    /// A controller or action is declared incompletely (e.g. an action
    /// carrying bindings or middleware but no verb and path).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A controller name collides with one already tracked by the registry.
    #[error("Duplicate controller: {0}")]
    DuplicateController(String),

    /// Two actions at the same final path disagree on public-vs-protected.
    #[error("Divergent permissions at path: {path}")]
    DivergentPermission {
        /// The colliding route path (namespace excluded).
        path: String,
    },

    /// A controller with undeclared actions was registered in a process that
    /// uses permissions, without opting in to implicit access.
    #[error("Implicit access denied: {0}")]
    ImplicitAccess(String),

    /// A validator was registered for a type tag that already has one.
    #[error("Cannot add validator with type {0}: already parsing that")]
    DuplicateType(String),

    /// A binding references a type tag with no registered validator.
    #[error("No validator for type: {0}")]
    UnknownType(String),

    // ── Request-scoped errors ────────────────────────────────────────

    /// A required query/route/body parameter is absent from the request.
    #[error("Missing property: {name}")]
    MissingParameter {
        /// The declared parameter name.
        name: String,
        /// The binding source the value was expected in (query, body, ...).
        from: String,
    },

    /// A parameter value failed parsing or validation.
    #[error("Invalid value: {name} should be a {expected}")]
    InvalidParameter {
        /// The declared parameter name.
        name: String,
        /// The expected semantic type.
        expected: String,
    },

    /// A whole-body binding found no parsed body on the request.
    #[error("Empty Body")]
    EmptyBody,

    /// No identity is attached to the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The identity lacks the required permission.
    #[error("Unauthorized")]
    Unauthorized,

    /// A business error carrying an explicit status code. These are treated
    /// as expected outcomes and are not reported to the error logger.
    #[error("{message}")]
    Web {
        /// The HTTP status code to respond with, used verbatim.
        status: u16,
        /// The error message.
        message: String,
        /// Optional structured body to respond with.
        body: Option<Value>,
    },

    /// An unclassified failure; responds as 500 and is always reported.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouteError {
    /// Creates a business error with an explicit status code and the
    /// standard structured body (`{"errors": [{"message": ...}]}`).
    pub fn web(message: impl Into<String>, status: u16) -> Self {
        let message = message.into();
        let body = json!({ "errors": [ { "message": message } ] });
        Self::Web {
            status,
            message,
            body: Some(body),
        }
    }

    /// Returns the HTTP status code associated with this error.
    ///
    /// - Binding failures (`MissingParameter`, `InvalidParameter`,
    ///   `EmptyBody`) -> 400
    /// - `Unauthenticated` -> 401
    /// - `Unauthorized` -> 403
    /// - `Web` -> its own status, verbatim
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameter { .. } | Self::InvalidParameter { .. } | Self::EmptyBody => 400,
            Self::Unauthenticated => 401,
            Self::Unauthorized => 403,
            Self::Web { status, .. } => *status,
            Self::Configuration(_)
            | Self::DuplicateController(_)
            | Self::DivergentPermission { .. }
            | Self::ImplicitAccess(_)
            | Self::DuplicateType(_)
            | Self::UnknownType(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns `true` if this error carries a deliberate status code.
    ///
    /// Expected errors form the response but are not reported to the error
    /// logger; only unexpected ones (plain 500s) are.
    pub const fn is_expected(&self) -> bool {
        !matches!(
            self,
            Self::Configuration(_)
                | Self::DuplicateController(_)
                | Self::DivergentPermission { .. }
                | Self::ImplicitAccess(_)
                | Self::DuplicateType(_)
                | Self::UnknownType(_)
                | Self::Internal(_)
        )
    }

    /// Returns the structured JSON body for this error, if any.
    ///
    /// Request-scoped errors respond with `{"errors": [{"message": ...}]}`;
    /// `Web` errors respond with their own body when present.
    pub fn error_body(&self) -> Option<Value> {
        match self {
            Self::Web { body, .. } => body.clone(),
            Self::MissingParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::EmptyBody
            | Self::Unauthenticated
            | Self::Unauthorized => {
                Some(json!({ "errors": [ { "message": self.to_string() } ] }))
            }
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, RouteError>`.
pub type RouteResult<T> = Result<T, RouteError>;
