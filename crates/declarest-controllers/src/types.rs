//! The declarative data model: parameter sources, type tags, permission
//! declarations, and the argument vector handed to action handlers.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use declarest_http::{Identity, Request, ResponseWriter};

/// The declared type of a bound parameter, keying into the validator
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// The raw request context.
    RawRequest,
    /// The raw response writer. Binding this disables auto-close.
    RawResponse,
    /// The caller identity attached by upstream middleware.
    RawIdentity,
    /// A UTF-8 string.
    String,
    /// A number.
    Number,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A boolean.
    Boolean,
    /// An application-registered type.
    Custom(std::string::String),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawRequest => write!(f, "request"),
            Self::RawResponse => write!(f, "response"),
            Self::RawIdentity => write!(f, "identity"),
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Object => write!(f, "object"),
            Self::Array => write!(f, "array"),
            Self::Boolean => write!(f, "boolean"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Where a bound parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    /// The whole request context.
    Request,
    /// The response writer.
    Response,
    /// The `user` identity slot, falling back to `auth`.
    User,
    /// The `auth` identity slot, falling back to `user`.
    Auth,
    /// A named query parameter.
    Query,
    /// A named dynamic route segment.
    RouteParam,
    /// A named field of the JSON body.
    BodyField,
    /// The whole JSON body.
    WholeBody,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Response => write!(f, "response"),
            Self::User => write!(f, "user"),
            Self::Auth => write!(f, "auth"),
            Self::Query => write!(f, "query"),
            Self::RouteParam => write!(f, "route"),
            Self::BodyField | Self::WholeBody => write!(f, "body"),
        }
    }
}

/// One declared parameter of an action.
#[derive(Debug, Clone)]
pub struct ParamBinding {
    /// Position in the handler's argument vector.
    pub index: usize,
    /// Where the value comes from.
    pub source: ParamSource,
    /// Name within the source, for named sources.
    pub name: Option<String>,
    /// Declared type, resolved against the validator registry.
    pub type_tag: TypeTag,
    /// Whether an absent value is tolerated.
    pub optional: bool,
}

/// A permission declaration on a controller or an action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PermissionDecl {
    /// No declaration on the action; the controller's declaration applies.
    #[default]
    Inherit,
    /// Explicitly open to anonymous callers, and advertised as public.
    Public,
    /// Any attached identity suffices.
    Authenticated,
    /// A specific named permission is required.
    Named(String),
    /// A permission whose name is derived from the mount location.
    Derived,
}

/// One resolved argument handed to a handler.
#[derive(Clone)]
pub enum Arg {
    /// A validated value.
    Value(Value),
    /// An optional binding whose source had no value.
    Absent,
    /// The raw request context.
    Request(Request),
    /// The response writer.
    Response(ResponseWriter),
    /// The caller identity, if attached.
    Identity(Option<Arc<dyn Identity>>),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Absent => write!(f, "Absent"),
            Self::Request(request) => f.debug_tuple("Request").field(request).finish(),
            Self::Response(writer) => f.debug_tuple("Response").field(writer).finish(),
            Self::Identity(identity) => f
                .debug_tuple("Identity")
                .field(&identity.is_some())
                .finish(),
        }
    }
}

/// The positional argument vector passed to an action handler, with typed
/// accessors for the common shapes.
///
/// # Examples
///
/// ```
/// use declarest_controllers::{Arg, Args};
/// use serde_json::json;
///
/// let args = Args::new(vec![Arg::Value(json!(33)), Arg::Value(json!("hello"))]);
/// assert_eq!(args.number(0), Some(33));
/// assert_eq!(args.string(1), Some("hello"));
/// assert_eq!(args.string(2), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Wraps a resolved argument vector.
    pub fn new(args: Vec<Arg>) -> Self {
        Self(args)
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// Returns `true` if the argument at `index` is an absent optional.
    pub fn is_absent(&self, index: usize) -> bool {
        matches!(self.0.get(index), Some(Arg::Absent))
    }

    /// Returns the validated value at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.0.get(index) {
            Some(Arg::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the value at `index` as a string.
    pub fn string(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(Value::as_str)
    }

    /// Returns the value at `index` as an integer.
    pub fn number(&self, index: usize) -> Option<i64> {
        self.value(index).and_then(Value::as_i64)
    }

    /// Returns the value at `index` as a boolean.
    pub fn boolean(&self, index: usize) -> Option<bool> {
        self.value(index).and_then(Value::as_bool)
    }

    /// Returns the request bound at `index`.
    pub fn request(&self, index: usize) -> Option<&Request> {
        match self.0.get(index) {
            Some(Arg::Request(request)) => Some(request),
            _ => None,
        }
    }

    /// Returns the response writer bound at `index`.
    pub fn response(&self, index: usize) -> Option<&ResponseWriter> {
        match self.0.get(index) {
            Some(Arg::Response(writer)) => Some(writer),
            _ => None,
        }
    }

    /// Returns the identity bound at `index`, if one was attached.
    pub fn identity(&self, index: usize) -> Option<&Arc<dyn Identity>> {
        match self.0.get(index) {
            Some(Arg::Identity(identity)) => identity.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_tag_display() {
        assert_eq!(TypeTag::String.to_string(), "string");
        assert_eq!(TypeTag::Number.to_string(), "number");
        assert_eq!(TypeTag::Custom("uuid".into()).to_string(), "uuid");
    }

    #[test]
    fn test_param_source_display() {
        assert_eq!(ParamSource::Query.to_string(), "query");
        assert_eq!(ParamSource::BodyField.to_string(), "body");
        assert_eq!(ParamSource::WholeBody.to_string(), "body");
    }

    #[test]
    fn test_permission_decl_default_inherits() {
        assert_eq!(PermissionDecl::default(), PermissionDecl::Inherit);
    }

    #[test]
    fn test_args_typed_accessors() {
        let args = Args::new(vec![
            Arg::Value(json!(7)),
            Arg::Value(json!("x")),
            Arg::Value(json!(true)),
            Arg::Absent,
        ]);
        assert_eq!(args.len(), 4);
        assert_eq!(args.number(0), Some(7));
        assert_eq!(args.string(1), Some("x"));
        assert_eq!(args.boolean(2), Some(true));
        assert!(args.is_absent(3));
        assert!(!args.is_absent(0));
        assert!(args.value(3).is_none());
        assert!(args.value(9).is_none());
    }

    #[test]
    fn test_args_context_accessors() {
        use declarest_http::Request;

        let args = Args::new(vec![
            Arg::Request(Request::builder().path("/x").build()),
            Arg::Response(declarest_http::ResponseWriter::new()),
            Arg::Identity(None),
        ]);
        assert_eq!(args.request(0).unwrap().path(), "/x");
        assert!(args.response(1).is_some());
        assert!(args.identity(2).is_none());
        assert!(args.request(1).is_none());
    }
}
