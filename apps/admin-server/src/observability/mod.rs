//! Observability - request correlation.

mod request_id;

pub use request_id::RequestIdMiddleware;
