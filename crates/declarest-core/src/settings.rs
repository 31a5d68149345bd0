//! Registration settings for controller mounting.
//!
//! [`RegisterSettings`] is handed to every `register`/`register_all` call and
//! carries the route namespace, the implicit-access opt-in, and the injected
//! logger closures.

use std::fmt;
use std::sync::Arc;

use crate::error::RouteError;

/// Receives one human-readable line per registered route or middleware.
pub type DebugLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives every unexpected (status-less) error caught at the handler
/// boundary, before the 500 response is formed.
pub type ErrorLogger = Arc<dyn Fn(&RouteError) + Send + Sync>;

/// Settings shared by one registration pass.
///
/// # Examples
///
/// ```
/// use declarest_core::RegisterSettings;
///
/// let settings = RegisterSettings::new()
///     .namespace("api/v2")
///     .implicit_access(true);
/// assert_eq!(settings.namespace.as_deref(), Some("/api/v2"));
/// ```
#[derive(Clone, Default)]
pub struct RegisterSettings {
    /// Route prefix mounted ahead of every controller base path. Excluded
    /// from derived permission names and public-route listings.
    pub namespace: Option<String>,
    /// Opt-in allowing undeclared (open) actions in a process where other
    /// controllers declare permissions.
    pub implicit_access: bool,
    /// Optional per-registration debug sink.
    pub debug_logger: Option<DebugLogger>,
    /// Optional sink for unexpected request-handling failures.
    pub error_logger: Option<ErrorLogger>,
}

impl RegisterSettings {
    /// Creates settings with no namespace, no loggers, and implicit access
    /// disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the route namespace. A leading slash is added when missing.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = Some(if namespace.starts_with('/') {
            namespace
        } else {
            format!("/{namespace}")
        });
        self
    }

    /// Sets the implicit-access opt-in.
    #[must_use]
    pub const fn implicit_access(mut self, allow: bool) -> Self {
        self.implicit_access = allow;
        self
    }

    /// Installs a debug logger closure.
    #[must_use]
    pub fn debug_logger(mut self, logger: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.debug_logger = Some(Arc::new(logger));
        self
    }

    /// Installs an error logger closure.
    #[must_use]
    pub fn error_logger(mut self, logger: impl Fn(&RouteError) + Send + Sync + 'static) -> Self {
        self.error_logger = Some(Arc::new(logger));
        self
    }

    /// Emits one debug line to the injected logger, if any.
    pub fn debug(&self, message: &str) {
        if let Some(logger) = &self.debug_logger {
            logger(message);
        }
    }

    /// Reports an unexpected error to the injected logger, if any.
    pub fn report_error(&self, error: &RouteError) {
        if let Some(logger) = &self.error_logger {
            logger(error);
        }
    }
}

impl fmt::Debug for RegisterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterSettings")
            .field("namespace", &self.namespace)
            .field("implicit_access", &self.implicit_access)
            .field("has_debug_logger", &self.debug_logger.is_some())
            .field("has_error_logger", &self.error_logger.is_some())
            .finish()
    }
}
