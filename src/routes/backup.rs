use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::tally::{OkResponse, RestoreQuery},
    error::AppError,
    services::tally_service,
    state::SharedState,
};

/// Configure the backup and export routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/backups", get(list_backups))
        .route("/api/restore", get(restore))
        .route("/api/gen-backup-index", post(gen_backup_index))
}

#[utoipa::path(
    get,
    path = "/api/backups",
    tag = "backup",
    responses((status = 200, description = "Backup data-file names, newest first", body = [String]))
)]
/// List available backup files, newest first.
pub async fn list_backups(State(state): State<SharedState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(tally_service::list_backups(&state.workspace)?))
}

#[utoipa::path(
    get,
    path = "/api/restore",
    tag = "backup",
    params(("name" = String, Query, description = "Backup file to restore, with or without extension")),
    responses(
        (status = 200, description = "Backup restored", body = OkResponse),
        (status = 400, description = "Missing name parameter"),
        (status = 404, description = "No such backup"),
    )
)]
/// Restore a named backup over the live state.
pub async fn restore(
    State(state): State<SharedState>,
    Query(query): Query<RestoreQuery>,
) -> Result<Json<OkResponse>, AppError> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("name parameter is required".to_string()))?;
    tally_service::restore(&state.workspace, name)?;
    Ok(Json(OkResponse::new()))
}

#[utoipa::path(
    post,
    path = "/api/gen-backup-index",
    tag = "backup",
    responses((status = 200, description = "Backup index regenerated", body = OkResponse))
)]
/// Rebuild the browser-facing backup index and wrapper files.
pub async fn gen_backup_index(
    State(state): State<SharedState>,
) -> Result<Json<OkResponse>, AppError> {
    tally_service::regenerate_backup_index(&state.workspace)?;
    Ok(Json(OkResponse::new()))
}
