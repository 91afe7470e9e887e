//! Shared application state handed to every HTTP handler.

use std::sync::Arc;

use crate::{config::EnvConfig, dao::Workspace};

pub type SharedState = Arc<AppState>;

/// Central application state holding the workspace layout and environment
/// configuration resolved at startup.
pub struct AppState {
    pub workspace: Workspace,
    pub env: EnvConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(workspace: Workspace, env: EnvConfig) -> SharedState {
        Arc::new(Self { workspace, env })
    }
}
