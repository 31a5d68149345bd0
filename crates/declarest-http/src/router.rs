//! Host router contract and the in-memory reference router.
//!
//! The routing layer registers composed handlers against any [`HostRouter`]:
//! a routing table keyed by `(verb, path)` plus a per-request middleware
//! chain invoked in registration order and filtered by path prefix.
//! [`MemoryRouter`] is the reference implementation used by the test suites
//! and by the axum bridge.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::{Method, StatusCode};
use regex::Regex;

use declarest_core::{RouteError, RouteResult};

use crate::request::Request;
use crate::response::Response;

/// A boxed future, as produced by composed handlers and middleware.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A fully composed request handler mounted on a router.
pub type RouteHandler = Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>;

/// The outcome of one middleware invocation.
pub enum MiddlewareDecision {
    /// Pass the (possibly modified) request on to the next stage.
    Continue(Request),
    /// Short-circuit the pipeline with a response.
    Halt(Response),
}

/// A middleware function attached to a path prefix.
pub type MiddlewareFn = Arc<dyn Fn(Request) -> BoxFuture<MiddlewareDecision> + Send + Sync>;

/// The routing table contract consumed by controller registration.
pub trait HostRouter {
    /// Registers a handler under `(method, path)`. The path may contain
    /// `:name` dynamic segments.
    fn mount(&mut self, method: Method, path: &str, handler: RouteHandler) -> RouteResult<()>;

    /// Attaches a middleware to every request whose path starts with the
    /// given prefix. Middleware runs in attachment order.
    fn attach(&mut self, path_prefix: &str, middleware: MiddlewareFn) -> RouteResult<()>;
}

/// A compiled route path with `:name` dynamic segments.
///
/// # Examples
///
/// ```
/// use declarest_http::PathPattern;
///
/// let pattern = PathPattern::parse("/users/:id").unwrap();
/// let params = pattern.full_match("/users/42").unwrap();
/// assert_eq!(params["id"], "42");
/// assert!(pattern.full_match("/users").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    full: Regex,
    prefix: Regex,
    params: Vec<String>,
}

impl PathPattern {
    /// Compiles a route path into a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Configuration`] when a dynamic segment name is
    /// not a valid identifier.
    pub fn parse(path: &str) -> RouteResult<Self> {
        let mut body = String::new();
        let mut params = Vec::new();
        for (i, segment) in path.split('/').enumerate() {
            if i > 0 {
                body.push('/');
            }
            if let Some(name) = segment.strip_prefix(':') {
                body.push_str(&format!("(?P<{name}>[^/]+)"));
                params.push(name.to_string());
            } else {
                body.push_str(&regex::escape(segment));
            }
        }
        let full = Regex::new(&format!("^{body}$")).map_err(|e| {
            RouteError::Configuration(format!("invalid route path {path:?}: {e}"))
        })?;
        let prefix = Regex::new(&format!("^{body}(/|$)")).map_err(|e| {
            RouteError::Configuration(format!("invalid route path {path:?}: {e}"))
        })?;
        Ok(Self {
            raw: path.to_string(),
            full,
            prefix,
            params,
        })
    }

    /// Returns the original route path.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the dynamic segment names, in order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Matches the whole path, returning captured route parameters.
    pub fn full_match(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.full.captures(path)?;
        let mut matched = HashMap::new();
        for name in &self.params {
            if let Some(value) = captures.name(name) {
                matched.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(matched)
    }

    /// Returns `true` if the path starts with this pattern at a segment
    /// boundary.
    pub fn matches_prefix(&self, path: &str) -> bool {
        self.prefix.is_match(path)
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: RouteHandler,
}

struct AttachedMiddleware {
    pattern: PathPattern,
    middleware: MiddlewareFn,
}

/// An in-memory router: the reference [`HostRouter`] implementation.
///
/// Dispatch runs attached middleware in order (path-prefix filtered), then
/// the first route matching `(method, path)`. Unmatched requests get a 404.
#[derive(Default)]
pub struct MemoryRouter {
    routes: Vec<Route>,
    middlewares: Vec<AttachedMiddleware>,
}

impl MemoryRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of mounted routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns the number of attached middleware.
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Dispatches one request through the middleware chain and the routing
    /// table.
    pub async fn dispatch(&self, request: Request) -> Response {
        let span =
            declarest_core::logging::request_span(request.method().as_str(), request.path());
        tracing::Instrument::instrument(self.dispatch_inner(request), span).await
    }

    async fn dispatch_inner(&self, request: Request) -> Response {
        let mut request = request;
        for attached in &self.middlewares {
            if attached.pattern.matches_prefix(request.path()) {
                match (attached.middleware)(request).await {
                    MiddlewareDecision::Continue(next) => request = next,
                    MiddlewareDecision::Halt(response) => return response,
                }
            }
        }

        let matched = self.routes.iter().find_map(|route| {
            if route.method == *request.method() {
                route.pattern.full_match(request.path()).map(|p| (route, p))
            } else {
                None
            }
        });

        match matched {
            Some((route, params)) => {
                request.set_route_params(params);
                (route.handler)(request).await
            }
            None => {
                tracing::debug!("no route matched");
                Response::status_only(StatusCode::NOT_FOUND)
            }
        }
    }
}

impl HostRouter for MemoryRouter {
    fn mount(&mut self, method: Method, path: &str, handler: RouteHandler) -> RouteResult<()> {
        let pattern = PathPattern::parse(path)?;
        tracing::debug!(%method, path, "mounting route");
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    fn attach(&mut self, path_prefix: &str, middleware: MiddlewareFn) -> RouteResult<()> {
        let pattern = PathPattern::parse(path_prefix)?;
        self.middlewares.push(AttachedMiddleware {
            pattern,
            middleware,
        });
        Ok(())
    }
}

impl std::fmt::Debug for MemoryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRouter")
            .field("route_count", &self.routes.len())
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}
