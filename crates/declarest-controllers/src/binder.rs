//! Per-parameter binders: the request-time closures that resolve one
//! declared binding into an argument.
//!
//! Binders are built once, at registration time, with the binding and its
//! validator already resolved. At request time each binder either produces
//! an [`Arg`] or fails with a 400-class error, which aborts binding before
//! the business function runs.

use std::sync::Arc;

use declarest_core::{RouteError, RouteResult};
use declarest_http::{Request, ResponseWriter};

use crate::types::{Arg, ParamBinding, ParamSource};
use crate::validator::Validator;

/// Resolves one argument from a request.
pub type Binder = Arc<dyn Fn(&Request, &ResponseWriter) -> RouteResult<Arg> + Send + Sync>;

/// Builds the binder for one declared binding.
///
/// Named sources (`Query`, `RouteParam`, `BodyField`) require the binding
/// to carry a name; the registrar validates that before calling here.
pub fn resolver(binding: &ParamBinding, validator: &Validator) -> Binder {
    let binding = binding.clone();
    let validator = validator.clone();

    Arc::new(move |request, writer| match binding.source {
        ParamSource::Request => Ok(Arg::Request(request.clone())),
        ParamSource::Response => Ok(Arg::Response(writer.clone())),
        ParamSource::User | ParamSource::Auth => {
            Ok(Arg::Identity(request.identity().cloned()))
        }
        ParamSource::Query | ParamSource::RouteParam => {
            let name = binding.name.as_deref().unwrap_or_default();
            let raw = match binding.source {
                ParamSource::Query => request.query(name),
                _ => request.route_param(name),
            };
            match raw {
                None if binding.optional => Ok(Arg::Absent),
                None => Err(RouteError::MissingParameter {
                    name: name.to_string(),
                    from: binding.source.to_string(),
                }),
                Some(raw) => {
                    let value = validator.parse(raw).ok_or_else(|| invalid(&binding))?;
                    if validator.check(&value) {
                        Ok(Arg::Value(value))
                    } else {
                        Err(invalid(&binding))
                    }
                }
            }
        }
        ParamSource::BodyField => {
            let name = binding.name.as_deref().unwrap_or_default();
            match request.body().and_then(|body| body.get(name)) {
                None if binding.optional => Ok(Arg::Absent),
                None => Err(RouteError::MissingParameter {
                    name: name.to_string(),
                    from: binding.source.to_string(),
                }),
                Some(value) => {
                    if validator.check(value) {
                        Ok(Arg::Value(value.clone()))
                    } else {
                        Err(invalid(&binding))
                    }
                }
            }
        }
        ParamSource::WholeBody => match request.body() {
            None => Err(RouteError::EmptyBody),
            Some(body) => {
                if validator.check(body) {
                    Ok(Arg::Value(body.clone()))
                } else {
                    Err(RouteError::InvalidParameter {
                        name: "body".to_string(),
                        expected: binding.type_tag.to_string(),
                    })
                }
            }
        },
    })
}

fn invalid(binding: &ParamBinding) -> RouteError {
    RouteError::InvalidParameter {
        name: binding.name.clone().unwrap_or_default(),
        expected: binding.type_tag.to_string(),
    }
}
