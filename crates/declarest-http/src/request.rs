//! The inbound request context.
//!
//! [`Request`] carries everything the binding layer consumes: the method and
//! path, the query and route-parameter collections (raw strings from the
//! transport), the parsed JSON body (produced by an upstream body-parsing
//! collaborator), and the optional `user`/`auth` identities attached by
//! upstream middleware.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use crate::identity::Identity;

/// One inbound HTTP request as seen by the dispatch pipeline.
///
/// # Examples
///
/// ```
/// use declarest_http::Request;
///
/// let request = Request::builder()
///     .method(http::Method::GET)
///     .path("/users/list")
///     .query_string("page=2&sort=name")
///     .build();
///
/// assert_eq!(request.query("page"), Some("2"));
/// assert_eq!(request.query("sort"), Some("name"));
/// ```
#[derive(Clone)]
pub struct Request {
    method: Method,
    path: String,
    hostname: String,
    query: HashMap<String, String>,
    route_params: HashMap<String, String>,
    body: Option<Value>,
    user: Option<Arc<dyn Identity>>,
    auth: Option<Arc<dyn Identity>>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the requested hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Looks up a query parameter by name.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Looks up a route parameter by name.
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params.get(name).map(String::as_str)
    }

    /// Returns the parsed request body, if an upstream collaborator parsed
    /// one.
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the `user` identity, if attached.
    pub fn user(&self) -> Option<&Arc<dyn Identity>> {
        self.user.as_ref()
    }

    /// Returns the `auth` identity, if attached.
    pub fn auth(&self) -> Option<&Arc<dyn Identity>> {
        self.auth.as_ref()
    }

    /// Returns the effective identity: `user`, falling back to `auth`.
    pub fn identity(&self) -> Option<&Arc<dyn Identity>> {
        self.user.as_ref().or(self.auth.as_ref())
    }

    /// Attaches a `user` identity. Intended for authentication middleware.
    pub fn set_user(&mut self, identity: Arc<dyn Identity>) {
        self.user = Some(identity);
    }

    /// Attaches an `auth` identity. Intended for authentication middleware.
    pub fn set_auth(&mut self, identity: Arc<dyn Identity>) {
        self.auth = Some(identity);
    }

    /// Replaces the route parameters. Filled in by the router on match.
    pub fn set_route_params(&mut self, params: HashMap<String, String>) {
        self.route_params = params;
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("hostname", &self.hostname)
            .field("query", &self.query)
            .field("route_params", &self.route_params)
            .field("has_body", &self.body.is_some())
            .field("has_user", &self.user.is_some())
            .field("has_auth", &self.auth.is_some())
            .finish()
    }
}

/// Builder for [`Request`] values, primarily for tests and bridges.
#[derive(Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    hostname: Option<String>,
    query: HashMap<String, String>,
    body: Option<Value>,
    user: Option<Arc<dyn Identity>>,
    auth: Option<Arc<dyn Identity>>,
}

impl RequestBuilder {
    /// Sets the HTTP method (defaults to GET).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request path (defaults to `/`).
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the hostname (defaults to `localhost`).
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Adds one query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Parses a raw query string (without the leading `?`) into parameters.
    #[must_use]
    pub fn query_string(mut self, raw: &str) -> Self {
        for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            self.query.insert(name.into_owned(), value.into_owned());
        }
        self
    }

    /// Sets the parsed JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a `user` identity.
    #[must_use]
    pub fn user(mut self, identity: Arc<dyn Identity>) -> Self {
        self.user = Some(identity);
        self
    }

    /// Attaches an `auth` identity.
    #[must_use]
    pub fn auth(mut self, identity: Arc<dyn Identity>) -> Self {
        self.auth = Some(identity);
        self
    }

    /// Builds the [`Request`].
    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            path: self.path.unwrap_or_else(|| "/".to_string()),
            hostname: self.hostname.unwrap_or_else(|| "localhost".to_string()),
            query: self.query,
            route_params: HashMap::new(),
            body: self.body,
            user: self.user,
            auth: self.auth,
        }
    }
}
