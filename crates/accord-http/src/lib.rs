//! # accord-http
//!
//! REST transport for the platform API: templated routes, a global
//! rate-limit gate, and a request loop with bounded retries for transient
//! failures. Client errors (404/401/403) surface immediately as typed
//! errors carrying the raw response body.

mod error;
mod ratelimit;
mod route;
pub mod routes;
mod transport;

pub use error::HttpError;
pub use ratelimit::RateLimitGate;
pub use route::Route;
pub use transport::{ApiResponse, FileAttachment, RequestOptions, Rest};
