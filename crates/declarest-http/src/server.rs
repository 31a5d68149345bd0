//! Axum bridge for the in-memory router.
//!
//! [`App`] wraps a [`MemoryRouter`] and exposes it as an axum router or as a
//! runnable HTTP server. All requests funnel through one catch-all handler
//! that converts the axum request into a [`Request`], dispatches it, and
//! converts the [`Response`](crate::Response) back.

use std::sync::Arc;

use axum::body::Body;
use axum::response::IntoResponse;
use axum::routing::any;

use declarest_core::RouteError;

use crate::request::Request;
use crate::router::MemoryRouter;

/// A runnable application around a fully registered [`MemoryRouter`].
///
/// # Examples
///
/// ```
/// use declarest_http::{App, MemoryRouter};
///
/// let app = App::new(MemoryRouter::new());
/// let _router = app.into_axum_router();
/// ```
pub struct App {
    router: Arc<MemoryRouter>,
}

impl App {
    /// Wraps a registered router.
    pub fn new(router: MemoryRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Returns the number of mounted routes.
    pub fn route_count(&self) -> usize {
        self.router.route_count()
    }

    /// Converts the application into an axum router.
    pub fn into_axum_router(self) -> axum::Router {
        let router = self.router;

        let handler = move |axum_request: axum::extract::Request<Body>| {
            let router = router.clone();
            async move {
                let (parts, body) = axum_request.into_parts();
                let body_bytes = axum::body::to_bytes(body, usize::MAX)
                    .await
                    .unwrap_or_default();

                let request = request_from_parts(&parts, &body_bytes);
                router.dispatch(request).await.into_response()
            }
        };

        axum::Router::new()
            .route("/{*path}", any(handler.clone()))
            .route("/", any(handler))
    }

    /// Runs the application as an HTTP server on the given address.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Configuration`] when the address cannot be
    /// bound, or [`RouteError::Internal`] on a runtime server error.
    pub async fn serve(self, addr: &str) -> Result<(), RouteError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RouteError::Configuration(format!("failed to bind to {addr}: {e}")))?;

        tracing::info!("listening on http://{addr}/");

        axum::serve(listener, self.into_axum_router())
            .await
            .map_err(|e| RouteError::Internal(format!("server error: {e}")))
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("route_count", &self.router.route_count())
            .field("middleware_count", &self.router.middleware_count())
            .finish()
    }
}

fn request_from_parts(parts: &http::request::Parts, body: &[u8]) -> Request {
    let mut builder = Request::builder()
        .method(parts.method.clone())
        .path(parts.uri.path());

    if let Some(query) = parts.uri.query() {
        builder = builder.query_string(query);
    }

    if let Some(host) = parts
        .headers
        .get(http::header::HOST)
        .and_then(|value| value.to_str().ok())
    {
        let hostname = host.split(':').next().unwrap_or(host);
        builder = builder.hostname(hostname);
    }

    let is_json = parts
        .headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json && !body.is_empty() {
        if let Ok(value) = serde_json::from_slice(body) {
            builder = builder.body(value);
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    fn parts_for(uri: &str, headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder().method(Method::POST).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_request_from_parts_path_and_query() {
        let parts = parts_for("/users/list?page=2", &[]);
        let request = request_from_parts(&parts, b"");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/users/list");
        assert_eq!(request.query("page"), Some("2"));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_request_from_parts_hostname_strips_port() {
        let parts = parts_for("/x", &[("host", "api.example.com:8080")]);
        let request = request_from_parts(&parts, b"");
        assert_eq!(request.hostname(), "api.example.com");
    }

    #[test]
    fn test_request_from_parts_json_body() {
        let parts = parts_for("/x", &[("content-type", "application/json")]);
        let request = request_from_parts(&parts, br#"{"name":"x"}"#);
        assert_eq!(request.body().unwrap(), &json!({ "name": "x" }));
    }

    #[test]
    fn test_request_from_parts_ignores_non_json_body() {
        let parts = parts_for("/x", &[("content-type", "text/plain")]);
        let request = request_from_parts(&parts, b"hello");
        assert!(request.body().is_none());
    }

    #[test]
    fn test_into_axum_router() {
        let app = App::new(MemoryRouter::new());
        let _router = app.into_axum_router();
    }

    #[tokio::test]
    async fn test_serve_invalid_address() {
        let app = App::new(MemoryRouter::new());
        let result = app.serve("invalid-address").await;
        assert!(result.is_err());
    }
}
