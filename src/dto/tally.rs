//! DTO definitions for the tally REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to flip a participant's done flag.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DoneRequest {
    pub name: String,
    pub done: bool,
}

/// Request to move a participant to a delivery status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusRequest {
    pub name: String,
    pub status: String,
}

/// Query parameters accepted by the restore endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RestoreQuery {
    #[serde(default)]
    pub name: Option<String>,
}

/// Generic acknowledgement returned by mutating endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}
