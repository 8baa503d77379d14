// HTTP API routes
//
// Auth and account routes live in crate::auth; this module holds the shared
// DTOs, input validation and the protected area entry points.

pub mod common;
pub mod pages;
pub mod validation;

// Re-export common types
pub use common::{ErrorResponse, PrincipalResponse};
