//! Logging integration for the declarest routing layer.
//!
//! Provides a helper for configuring [`tracing`]-based logging. Route
//! registration and the request pipeline emit `tracing` events regardless of
//! the per-registration logger closures in
//! [`RegisterSettings`](crate::settings::RegisterSettings).

/// Sets up the global tracing subscriber with the given filter directive
/// (e.g. "debug", "info", "declarest=debug").
///
/// When `pretty` is set a human-readable format is used; otherwise a
/// structured JSON format suitable for log aggregation.
pub fn setup_logging(filter: &str, pretty: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if pretty {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one dispatched request.
///
/// # Examples
///
/// ```
/// use declarest_core::logging::request_span;
///
/// let span = request_span("GET", "/users/list");
/// let _guard = span.enter();
/// tracing::debug!("handling request");
/// ```
pub fn request_span(method: &str, path: &str) -> tracing::Span {
    tracing::debug_span!("request", %method, %path)
}
