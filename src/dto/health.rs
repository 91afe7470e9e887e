//! Health check response body.

use serde::Serialize;
use utoipa::ToSchema;

use crate::clock;

/// Response of the `/api/health` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always true when the server answers at all.
    pub ok: bool,
    /// Server time, RFC 3339.
    pub time: String,
}

impl HealthResponse {
    /// Healthy response stamped with the current time.
    pub fn now() -> Self {
        Self {
            ok: true,
            time: clock::now_utc_rfc3339(),
        }
    }
}
