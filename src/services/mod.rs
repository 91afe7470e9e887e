//! Operations composing the model, persistence, export, and notifier layers.

/// OpenAPI documentation aggregation.
pub mod documentation;
/// Best-effort Discord notification orchestration.
pub mod notify_service;
/// Core tally operations shared by the CLI and the HTTP API.
pub mod tally_service;
