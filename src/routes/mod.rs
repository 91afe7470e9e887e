use axum::Router;

use crate::{error::AppError, state::SharedState};

pub mod backup;
pub mod docs;
pub mod health;
pub mod tally;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(tally::router())
        .merge(backup::router())
        .method_not_allowed_fallback(method_not_allowed);

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
