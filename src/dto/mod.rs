//! Request/response bodies of the HTTP API.

/// Health check response.
pub mod health;
/// Tally and backup request/response bodies.
pub mod tally;
/// Validation helpers shared by DTOs and services.
pub mod validation;
