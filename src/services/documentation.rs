use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the tally server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::tally::get_state,
        crate::routes::tally::reset,
        crate::routes::tally::set_done,
        crate::routes::tally::set_status,
        crate::routes::backup::list_backups,
        crate::routes::backup::restore,
        crate::routes::backup::gen_backup_index,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::tally::DoneRequest,
            crate::dto::tally::StatusRequest,
            crate::dto::tally::OkResponse,
            crate::model::TallyState,
            crate::model::UserRecord,
            crate::model::RewardFlags,
            crate::model::RecordStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tally", description = "Live tally state and per-user updates"),
        (name = "backup", description = "Backup, restore and browser index maintenance"),
    )
)]
pub struct ApiDoc;
