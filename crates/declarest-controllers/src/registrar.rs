//! Pipeline composition and mounting.
//!
//! The registrar turns one declared action into a mounted route: it
//! validates the declaration, resolves every binding against the validator
//! registry, builds the permission gate, and composes the request pipeline
//! (middleware, gate, binders, business function, serialization, error
//! boundary) as a single [`RouteHandler`].

use http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

use declarest_core::{RegisterSettings, RouteError, RouteResult};
use declarest_http::{
    HostRouter, MiddlewareDecision, MiddlewareFn, Request, Response, ResponseWriter, RouteHandler,
};

use crate::action::{Action, ActionFn};
use crate::binder::{resolver, Binder};
use crate::controller::Controller;
use crate::permission::{PermissionGate, SharedRoles};
use crate::types::ParamSource;
use crate::validator::ValidatorRegistry;

/// Mounts every action of a controller on the router.
pub(crate) fn register_controller(
    controller: &Controller,
    router: &mut dyn HostRouter,
    settings: &RegisterSettings,
    validators: &ValidatorRegistry,
    roles: &SharedRoles,
) -> RouteResult<()> {
    for action in controller.actions() {
        register_action(controller, action, router, settings, validators, roles)?;
    }
    Ok(())
}

fn register_action(
    controller: &Controller,
    action: &Action,
    router: &mut dyn HostRouter,
    settings: &RegisterSettings,
    validators: &ValidatorRegistry,
    roles: &SharedRoles,
) -> RouteResult<()> {
    let member = format!("{}::{}", controller.name(), action.member_name());

    let Some(method) = action.method() else {
        return Err(RouteError::Configuration(format!(
            "action {member} has no HTTP verb"
        )));
    };
    let Some(action_fn) = action.action_fn() else {
        return Err(RouteError::Configuration(format!(
            "action {member} has no handler"
        )));
    };

    let (binders, auto_close) = build_binders(&member, action, validators)?;
    let gate = PermissionGate::new(controller.resolve_action(action), roles.clone());

    let namespace = settings.namespace.as_deref().unwrap_or_default();
    let full_path = format!("{namespace}{}{}", controller.name(), action.path());

    for (verb, middleware) in action.middleware_fns() {
        router.attach(&full_path, verb_filtered(verb.clone(), middleware.clone()))?;
        settings.debug(&format!("middleware attached at {full_path}"));
    }

    let handler = compose_handler(gate, binders, action_fn.clone(), auto_close, settings.clone());
    router.mount(method.clone(), &full_path, handler)?;

    tracing::debug!(%method, path = %full_path, "registered action");
    settings.debug(&format!("registered {method} {full_path}"));
    Ok(())
}

/// Validates the bindings of an action and resolves each to its binder, in
/// argument order. Also decides auto-close: binding any type whose validator
/// takes over the response disables it.
fn build_binders(
    member: &str,
    action: &Action,
    validators: &ValidatorRegistry,
) -> RouteResult<(Vec<Binder>, bool)> {
    let mut bindings: Vec<_> = action.bindings().iter().collect();
    bindings.sort_by_key(|binding| binding.index);

    let mut binders = Vec::with_capacity(bindings.len());
    let mut auto_close = true;
    for (position, binding) in bindings.iter().enumerate() {
        if binding.index != position {
            return Err(RouteError::Configuration(format!(
                "parameter indexes of {member} must be unique and dense from 0"
            )));
        }
        let named_source = matches!(
            binding.source,
            ParamSource::Query | ParamSource::RouteParam | ParamSource::BodyField
        );
        if named_source && binding.name.is_none() {
            return Err(RouteError::Configuration(format!(
                "parameter {position} of {member} needs a name"
            )));
        }
        let validator = validators
            .get(&binding.type_tag)
            .ok_or_else(|| RouteError::UnknownType(binding.type_tag.to_string()))?;
        if validator.disables_auto_close() {
            auto_close = false;
        }
        binders.push(resolver(binding, validator));
    }
    Ok((binders, auto_close))
}

/// Wraps an action middleware so it only fires for its declared verb.
fn verb_filtered(verb: Option<http::Method>, middleware: MiddlewareFn) -> MiddlewareFn {
    Arc::new(move |request: Request| {
        let middleware = middleware.clone();
        let verb = verb.clone();
        Box::pin(async move {
            match verb {
                Some(verb) if *request.method() != verb => MiddlewareDecision::Continue(request),
                _ => middleware(request).await,
            }
        })
    })
}

fn compose_handler(
    gate: PermissionGate,
    binders: Vec<Binder>,
    action_fn: ActionFn,
    auto_close: bool,
    settings: RegisterSettings,
) -> RouteHandler {
    let binders = Arc::new(binders);
    Arc::new(move |request: Request| {
        let gate = gate.clone();
        let binders = binders.clone();
        let action_fn = action_fn.clone();
        let settings = settings.clone();
        Box::pin(async move {
            match execute(&request, &gate, &binders, &action_fn, auto_close).await {
                Ok(response) => response,
                Err(error) => {
                    if !error.is_expected() {
                        tracing::error!(error = %error, path = %request.path(), "action failed");
                        settings.report_error(&error);
                    }
                    Response::from_error(&error)
                }
            }
        })
    })
}

async fn execute(
    request: &Request,
    gate: &PermissionGate,
    binders: &[Binder],
    action_fn: &ActionFn,
    auto_close: bool,
) -> RouteResult<Response> {
    gate.check(request).await?;

    let writer = ResponseWriter::new();
    let mut args = Vec::with_capacity(binders.len());
    for binder in binders {
        args.push(binder(request, &writer)?);
    }

    let result = action_fn(crate::types::Args::new(args)).await?;

    if auto_close {
        Ok(match result {
            Some(Value::String(text)) => Response::text(StatusCode::OK, text),
            Some(value) => Response::json(StatusCode::OK, value),
            None => Response::status_only(StatusCode::OK),
        })
    } else {
        // The action owns the exchange; whatever it wrote is the response.
        Ok(writer
            .take()
            .unwrap_or_else(|| Response::status_only(StatusCode::OK)))
    }
}
