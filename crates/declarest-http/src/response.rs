//! The outbound response and the writer handle for raw-response bindings.

use std::fmt;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use serde_json::Value;

use declarest_core::RouteError;

/// The body of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// UTF-8 text, sent as `text/plain`.
    Text(String),
    /// A JSON document, sent as `application/json`.
    Json(Value),
}

/// One outbound HTTP response.
///
/// # Examples
///
/// ```
/// use declarest_http::Response;
/// use http::StatusCode;
///
/// let response = Response::text(StatusCode::OK, "hello");
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.text_body(), Some("hello"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: ResponseBody,
}

impl Response {
    /// Creates a plain-text response.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    /// Creates a JSON response.
    pub const fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(body),
        }
    }

    /// Creates a status-only response whose body is the canonical reason
    /// phrase (e.g. `"OK"` for 200), or the numeric code when the status has
    /// no canonical phrase.
    pub fn status_only(status: StatusCode) -> Self {
        let body = status
            .canonical_reason()
            .map_or_else(|| status.as_u16().to_string(), str::to_string);
        Self {
            status,
            body: ResponseBody::Text(body),
        }
    }

    /// Creates a 200 OK text response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::text(StatusCode::OK, body)
    }

    /// Forms the response for an error caught at the handler boundary.
    ///
    /// The error's status is used verbatim; a structured JSON body is
    /// preferred, then a plain-text message for status-carrying errors, then
    /// a status-only response.
    pub fn from_error(error: &RouteError) -> Self {
        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match error.error_body() {
            Some(body) => Self::json(status, body),
            None => {
                if let RouteError::Web { message, .. } = error {
                    Self::text(status, message.clone())
                } else {
                    Self::status_only(status)
                }
            }
        }
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the body.
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Returns the body as text, if it is a text body.
    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the body as JSON, if it is a JSON body.
    pub const fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Converts this response into an axum response.
    pub fn into_axum(self) -> axum::response::Response {
        axum::response::IntoResponse::into_response(self)
    }
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let builder = axum::response::Response::builder().status(self.status);
        let result = match self.body {
            ResponseBody::Empty => builder.body(axum::body::Body::empty()),
            ResponseBody::Text(text) => builder
                .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(axum::body::Body::from(text)),
            ResponseBody::Json(value) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(value.to_string())),
        };
        result.unwrap_or_else(|_| {
            axum::response::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(axum::body::Body::from("Internal Server Error"))
                .expect("fallback response should always be valid")
        })
    }
}

/// A shared response slot handed to actions that bind the raw response.
///
/// Binding the writer disables auto-close: the action becomes responsible
/// for terminating the exchange by writing through the handle. Whatever was
/// written is what the router sends back.
#[derive(Clone, Default)]
pub struct ResponseWriter {
    slot: Arc<Mutex<Option<Response>>>,
}

impl ResponseWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a plain-text response.
    pub fn send(&self, status: StatusCode, body: impl Into<String>) {
        self.store(Response::text(status, body));
    }

    /// Writes a JSON response.
    pub fn send_json(&self, status: StatusCode, body: Value) {
        self.store(Response::json(status, body));
    }

    /// Writes a status-only response.
    pub fn send_status(&self, status: StatusCode) {
        self.store(Response::status_only(status));
    }

    /// Returns `true` if a response has been written.
    pub fn is_written(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Takes the written response out of the slot, if any.
    pub fn take(&self) -> Option<Response> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }

    fn store(&self, response: Response) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(response);
        }
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("written", &self.is_written())
            .finish()
    }
}
