//! Type validators and the registry binding [`TypeTag`]s to them.
//!
//! Every declared parameter type resolves to a validator at registration
//! time. A validator carries two closures: `check` vets a value that is
//! already JSON (body fields), and `parse` turns a raw transport string
//! (query and route parameters) into a value. Registering an action whose
//! type has no validator is a configuration error, caught before anything
//! is mounted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use declarest_core::{RouteError, RouteResult};

use crate::types::TypeTag;

type CheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type ParseFn = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// A registered type validator.
#[derive(Clone)]
pub struct Validator {
    check: CheckFn,
    parse: ParseFn,
    disables_auto_close: bool,
}

impl Validator {
    /// Creates a validator from a check and a parse closure.
    pub fn new(
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
        parse: impl Fn(&str) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            check: Arc::new(check),
            parse: Arc::new(parse),
            disables_auto_close: false,
        }
    }

    /// Marks parameters of this type as taking over response writing.
    #[must_use]
    pub const fn disabling_auto_close(mut self) -> Self {
        self.disables_auto_close = true;
        self
    }

    /// Vets an already-parsed JSON value.
    pub fn check(&self, value: &Value) -> bool {
        (self.check)(value)
    }

    /// Parses a raw transport string into a value.
    pub fn parse(&self, raw: &str) -> Option<Value> {
        (self.parse)(raw)
    }

    /// Returns `true` if binding this type disables auto-close.
    pub const fn disables_auto_close(&self) -> bool {
        self.disables_auto_close
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("disables_auto_close", &self.disables_auto_close)
            .finish()
    }
}

/// The validator registry consulted during action registration.
///
/// Comes preloaded with validators for the built-in [`TypeTag`]s. Custom
/// types are added once; re-registering a type is rejected.
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    validators: HashMap<TypeTag, Validator>,
}

impl ValidatorRegistry {
    /// Creates a registry with the built-in validators installed.
    pub fn new() -> Self {
        let mut validators = HashMap::new();

        validators.insert(
            TypeTag::RawRequest,
            Validator::new(|_| true, |_| None),
        );
        validators.insert(
            TypeTag::RawResponse,
            Validator::new(|_| true, |_| None).disabling_auto_close(),
        );
        validators.insert(
            TypeTag::RawIdentity,
            Validator::new(|_| true, |_| None),
        );
        validators.insert(
            TypeTag::String,
            Validator::new(Value::is_string, |raw| {
                Some(Value::String(raw.to_string()))
            }),
        );
        validators.insert(
            TypeTag::Number,
            Validator::new(Value::is_number, |raw| {
                raw.parse::<i64>().ok().map(Value::from)
            }),
        );
        validators.insert(
            TypeTag::Boolean,
            Validator::new(Value::is_boolean, |raw| Some(Value::Bool(raw == "true"))),
        );
        validators.insert(
            TypeTag::Object,
            Validator::new(Value::is_object, |raw| {
                serde_json::from_str::<Value>(raw)
                    .ok()
                    .filter(Value::is_object)
            }),
        );
        validators.insert(
            TypeTag::Array,
            Validator::new(Value::is_array, |raw| {
                serde_json::from_str::<Value>(raw)
                    .ok()
                    .filter(Value::is_array)
            }),
        );

        Self { validators }
    }

    /// Registers a validator for a type.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateType`] when the type already has a
    /// validator.
    pub fn add(&mut self, tag: TypeTag, validator: Validator) -> RouteResult<()> {
        if self.validators.contains_key(&tag) {
            return Err(RouteError::DuplicateType(tag.to_string()));
        }
        self.validators.insert(tag, validator);
        Ok(())
    }

    /// Looks up the validator for a type.
    pub fn get(&self, tag: &TypeTag) -> Option<&Validator> {
        self.validators.get(tag)
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
