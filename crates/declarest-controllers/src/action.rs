//! Action declarations: one routable operation of a controller.
//!
//! An [`Action`] is declared with a chainable builder: a verb constructor
//! names the member and defaults the path to `/{member}`, then bindings,
//! middleware, and a permission declaration are layered on. The declaration
//! is inert until a registry composes and mounts it.

use std::future::Future;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use declarest_core::RouteResult;

use declarest_http::{BoxFuture, MiddlewareDecision, MiddlewareFn, Request};

use crate::types::{Args, ParamBinding, ParamSource, PermissionDecl, TypeTag};

/// The business function behind an action.
///
/// Returns the value to serialize: `None` closes the exchange with a bare
/// 200, a string becomes plain text, anything else becomes JSON. Actions
/// that bind the raw response writer return `None` and write themselves.
pub type ActionFn = Arc<dyn Fn(Args) -> BoxFuture<RouteResult<Option<Value>>> + Send + Sync>;

/// One declared action of a controller.
///
/// # Examples
///
/// ```
/// use declarest_controllers::{Action, TypeTag};
///
/// let action = Action::get("list")
///     .query(0, "page", TypeTag::Number)
///     .handler(|args| async move {
///         let page = args.number(0).unwrap_or(1);
///         Ok(Some(serde_json::json!({ "page": page })))
///     });
/// assert_eq!(action.path(), "/list");
/// ```
#[derive(Clone)]
pub struct Action {
    member_name: String,
    method: Option<Method>,
    path: String,
    bindings: Vec<ParamBinding>,
    middleware: Vec<(Option<Method>, MiddlewareFn)>,
    permission: PermissionDecl,
    handler: Option<ActionFn>,
}

impl Action {
    /// Declares an action with no verb. Registration rejects it unless a
    /// verb constructor was used instead.
    pub fn new(member_name: impl Into<String>) -> Self {
        let member_name = member_name.into();
        let path = format!("/{member_name}");
        Self {
            member_name,
            method: None,
            path,
            bindings: Vec::new(),
            middleware: Vec::new(),
            permission: PermissionDecl::Inherit,
            handler: None,
        }
    }

    fn with_method(member_name: impl Into<String>, method: Method) -> Self {
        let mut action = Self::new(member_name);
        action.method = Some(method);
        action
    }

    /// Declares a GET action routed at `/{member}`.
    pub fn get(member_name: impl Into<String>) -> Self {
        Self::with_method(member_name, Method::GET)
    }

    /// Declares a POST action routed at `/{member}`.
    pub fn post(member_name: impl Into<String>) -> Self {
        Self::with_method(member_name, Method::POST)
    }

    /// Declares a PUT action routed at `/{member}`.
    pub fn put(member_name: impl Into<String>) -> Self {
        Self::with_method(member_name, Method::PUT)
    }

    /// Declares a HEAD action routed at `/{member}`.
    pub fn head(member_name: impl Into<String>) -> Self {
        Self::with_method(member_name, Method::HEAD)
    }

    /// Declares an OPTIONS action routed at `/{member}`.
    pub fn options(member_name: impl Into<String>) -> Self {
        Self::with_method(member_name, Method::OPTIONS)
    }

    /// Declares a DELETE action routed at `/{member}`.
    pub fn delete(member_name: impl Into<String>) -> Self {
        Self::with_method(member_name, Method::DELETE)
    }

    /// Overrides the route path. A leading `/` is added when missing; the
    /// empty path mounts the action at the controller root.
    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.is_empty() || path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    /// Adds a middleware that runs before this action, in declaration
    /// order. It only fires for requests carrying this action's verb.
    #[must_use]
    pub fn middleware<F, Fut>(mut self, middleware: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareDecision> + Send + 'static,
    {
        let wrapped: MiddlewareFn = Arc::new(move |request| Box::pin(middleware(request)));
        self.middleware.push((self.method.clone(), wrapped));
        self
    }

    /// Requires a specific named permission.
    #[must_use]
    pub fn permission(mut self, name: impl Into<String>) -> Self {
        self.permission = PermissionDecl::Named(name.into());
        self
    }

    /// Requires a permission whose name is derived from the mount location.
    #[must_use]
    pub fn permission_default(mut self) -> Self {
        self.permission = PermissionDecl::Derived;
        self
    }

    /// Requires any attached identity.
    #[must_use]
    pub fn authorize(mut self) -> Self {
        self.permission = PermissionDecl::Authenticated;
        self
    }

    /// Opens the action to anonymous callers and advertises it as public.
    #[must_use]
    pub fn allow_anonymous(mut self) -> Self {
        self.permission = PermissionDecl::Public;
        self
    }

    fn bind(
        mut self,
        index: usize,
        source: ParamSource,
        name: Option<String>,
        type_tag: TypeTag,
        optional: bool,
    ) -> Self {
        self.bindings.push(ParamBinding {
            index,
            source,
            name,
            type_tag,
            optional,
        });
        self
    }

    /// Binds the raw request context at `index`.
    #[must_use]
    pub fn bind_request(self, index: usize) -> Self {
        self.bind(index, ParamSource::Request, None, TypeTag::RawRequest, false)
    }

    /// Binds the raw response writer at `index`, disabling auto-close.
    #[must_use]
    pub fn bind_response(self, index: usize) -> Self {
        self.bind(index, ParamSource::Response, None, TypeTag::RawResponse, false)
    }

    /// Binds the `user` identity at `index`.
    #[must_use]
    pub fn bind_user(self, index: usize) -> Self {
        self.bind(index, ParamSource::User, None, TypeTag::RawIdentity, false)
    }

    /// Binds the `auth` identity at `index`.
    #[must_use]
    pub fn bind_auth(self, index: usize) -> Self {
        self.bind(index, ParamSource::Auth, None, TypeTag::RawIdentity, false)
    }

    /// Binds a required query parameter at `index`.
    #[must_use]
    pub fn query(self, index: usize, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.bind(index, ParamSource::Query, Some(name.into()), type_tag, false)
    }

    /// Binds an optional query parameter at `index`.
    #[must_use]
    pub fn query_optional(self, index: usize, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.bind(index, ParamSource::Query, Some(name.into()), type_tag, true)
    }

    /// Binds a required dynamic route segment at `index`.
    #[must_use]
    pub fn route_param(self, index: usize, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.bind(index, ParamSource::RouteParam, Some(name.into()), type_tag, false)
    }

    /// Binds an optional dynamic route segment at `index`.
    #[must_use]
    pub fn route_param_optional(
        self,
        index: usize,
        name: impl Into<String>,
        type_tag: TypeTag,
    ) -> Self {
        self.bind(index, ParamSource::RouteParam, Some(name.into()), type_tag, true)
    }

    /// Binds a required field of the JSON body at `index`.
    #[must_use]
    pub fn body_field(self, index: usize, name: impl Into<String>, type_tag: TypeTag) -> Self {
        self.bind(index, ParamSource::BodyField, Some(name.into()), type_tag, false)
    }

    /// Binds an optional field of the JSON body at `index`.
    #[must_use]
    pub fn body_field_optional(
        self,
        index: usize,
        name: impl Into<String>,
        type_tag: TypeTag,
    ) -> Self {
        self.bind(index, ParamSource::BodyField, Some(name.into()), type_tag, true)
    }

    /// Binds the whole JSON body at `index`.
    #[must_use]
    pub fn whole_body(self, index: usize, type_tag: TypeTag) -> Self {
        self.bind(index, ParamSource::WholeBody, None, type_tag, false)
    }

    /// Sets the business function.
    #[must_use]
    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResult<Option<Value>>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |args| Box::pin(handler(args))));
        self
    }

    /// Returns the declared member name.
    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    /// Returns the HTTP verb, if one was declared.
    pub const fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Returns the route path relative to the controller.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the declared parameter bindings.
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// Returns the declared middleware with their verb filters.
    pub fn middleware_fns(&self) -> &[(Option<Method>, MiddlewareFn)] {
        &self.middleware
    }

    /// Returns the permission declaration.
    pub const fn permission_decl(&self) -> &PermissionDecl {
        &self.permission
    }

    /// Returns the business function, if one was set.
    pub const fn action_fn(&self) -> Option<&ActionFn> {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("member_name", &self.member_name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("bindings", &self.bindings.len())
            .field("middleware", &self.middleware.len())
            .field("permission", &self.permission)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_defaults_to_member_name() {
        let action = Action::get("list");
        assert_eq!(action.member_name(), "list");
        assert_eq!(action.path(), "/list");
        assert_eq!(action.method(), Some(&Method::GET));
    }

    #[test]
    fn test_at_normalizes_leading_slash() {
        assert_eq!(Action::get("x").at("custom").path(), "/custom");
        assert_eq!(Action::get("x").at("/custom").path(), "/custom");
        assert_eq!(Action::get("x").at("").path(), "");
    }

    #[test]
    fn test_verb_constructors() {
        assert_eq!(Action::post("x").method(), Some(&Method::POST));
        assert_eq!(Action::put("x").method(), Some(&Method::PUT));
        assert_eq!(Action::head("x").method(), Some(&Method::HEAD));
        assert_eq!(Action::options("x").method(), Some(&Method::OPTIONS));
        assert_eq!(Action::delete("x").method(), Some(&Method::DELETE));
        assert_eq!(Action::new("x").method(), None);
    }

    #[test]
    fn test_bindings_recorded_in_order() {
        let action = Action::get("x")
            .bind_request(0)
            .query(1, "page", TypeTag::Number)
            .body_field_optional(2, "note", TypeTag::String);
        let bindings = action.bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].source, ParamSource::Request);
        assert_eq!(bindings[1].name.as_deref(), Some("page"));
        assert!(bindings[2].optional);
    }

    #[test]
    fn test_permission_declarations() {
        assert_eq!(
            Action::get("x").permission_decl(),
            &PermissionDecl::Inherit
        );
        assert_eq!(
            Action::get("x").allow_anonymous().permission_decl(),
            &PermissionDecl::Public
        );
        assert_eq!(
            Action::get("x").authorize().permission_decl(),
            &PermissionDecl::Authenticated
        );
        assert_eq!(
            Action::get("x").permission("users:list").permission_decl(),
            &PermissionDecl::Named("users:list".into())
        );
        assert_eq!(
            Action::get("x").permission_default().permission_decl(),
            &PermissionDecl::Derived
        );
    }

    #[test]
    fn test_middleware_carries_verb_filter() {
        let action = Action::post("x")
            .middleware(|request| async move { MiddlewareDecision::Continue(request) });
        let (verb, _) = &action.middleware_fns()[0];
        assert_eq!(verb.as_ref(), Some(&Method::POST));
    }

    #[tokio::test]
    async fn test_handler_is_invocable() {
        let action = Action::get("x").handler(|_args| async move {
            Ok(Some(serde_json::json!("done")))
        });
        let result = action.action_fn().unwrap()(Args::default()).await.unwrap();
        assert_eq!(result, Some(serde_json::json!("done")));
    }
}
