//! # Quire Shared
//!
//! View-facing types used by every renderer of the admin UI.

pub mod pagination;
pub mod response;

pub use pagination::Pagination;
pub use response::ErrorResponse;
