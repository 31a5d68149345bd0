//! # declarest-http
//!
//! HTTP context for the declarest routing layer: the request/response types
//! seen by bound parameters, the [`Identity`] contract for authenticated
//! callers, the [`HostRouter`] contract controllers are mounted on, an
//! in-memory reference router, and a thin axum bridge.

pub mod identity;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use identity::{Identity, SimpleIdentity};
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBody, ResponseWriter};
pub use router::{
    BoxFuture, HostRouter, MemoryRouter, MiddlewareDecision, MiddlewareFn, PathPattern,
    RouteHandler,
};
pub use server::App;
