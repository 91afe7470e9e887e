use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dao,
    dto::tally::{DoneRequest, OkResponse, StatusRequest},
    error::{AppError, ServiceError},
    model::TallyState,
    services::tally_service,
    state::SharedState,
};

/// Configure the tally state routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/state", get(get_state))
        .route("/api/reset", post(reset))
        .route("/api/user/done", post(set_done))
        .route("/api/user/status", post(set_status))
}

#[utoipa::path(
    get,
    path = "/api/state",
    tag = "tally",
    responses((status = 200, description = "Current tally state", body = TallyState))
)]
/// Return the live tally state as stored on disk.
pub async fn get_state(State(state): State<SharedState>) -> Result<Json<TallyState>, AppError> {
    let tally = dao::tally::load_state(&state.workspace).map_err(ServiceError::from)?;
    Ok(Json(tally))
}

#[utoipa::path(
    post,
    path = "/api/reset",
    tag = "tally",
    responses(
        (status = 200, description = "State backed up and cleared", body = OkResponse),
        (status = 500, description = "Backup or persistence failed"),
    )
)]
/// Back up the current state, then clear it and open a new session.
pub async fn reset(State(state): State<SharedState>) -> Result<Json<OkResponse>, AppError> {
    tally_service::reset(&state.workspace, &state.env).await?;
    Ok(Json(OkResponse::new()))
}

#[utoipa::path(
    post,
    path = "/api/user/done",
    tag = "tally",
    request_body = DoneRequest,
    responses(
        (status = 200, description = "Done flag updated", body = OkResponse),
        (status = 400, description = "Missing name"),
        (status = 404, description = "Unknown participant"),
    )
)]
/// Flip a participant's done flag.
pub async fn set_done(
    State(state): State<SharedState>,
    Json(req): Json<DoneRequest>,
) -> Result<Json<OkResponse>, AppError> {
    tally_service::set_done(&state.workspace, &state.env, &req.name, req.done).await?;
    Ok(Json(OkResponse::new()))
}

#[utoipa::path(
    post,
    path = "/api/user/status",
    tag = "tally",
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Delivery status updated", body = OkResponse),
        (status = 400, description = "Missing name or unknown status"),
        (status = 404, description = "Unknown participant"),
    )
)]
/// Move a participant to a delivery status.
pub async fn set_status(
    State(state): State<SharedState>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OkResponse>, AppError> {
    tally_service::set_status(&state.workspace, &state.env, &req.name, &req.status).await?;
    Ok(Json(OkResponse::new()))
}
