//! # Quire Core
//!
//! The domain layer of the Quire admin backend.
//! Posts, their validation rules, the ownership policy and the service that
//! drives every post operation. No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod service;
pub mod validation;

pub use error::DomainError;
pub use service::{FormOptions, PER_PAGE, PostDetail, PostService};
pub use validation::{FieldErrors, PostInput};
