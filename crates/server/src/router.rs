use super::{handlers, state::AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::stats_handler))
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler))
        .route("/auth/me", get(handlers::get_me_handler))
        .route(
            "/vaults",
            get(handlers::list_vaults_handler).post(handlers::create_vault_handler),
        )
        .route(
            "/vaults/{vault_id}",
            get(handlers::get_vault_handler)
                .patch(handlers::update_vault_handler)
                .delete(handlers::delete_vault_handler),
        )
        .route(
            "/vaults/{vault_id}/members",
            get(handlers::list_members_handler).post(handlers::add_member_handler),
        )
        .route(
            "/vaults/{vault_id}/members/{user_id}",
            axum::routing::patch(handlers::change_member_role_handler)
                .delete(handlers::remove_member_handler),
        )
        .route(
            "/vaults/{vault_id}/sources",
            get(handlers::list_sources_handler).post(handlers::create_source_handler),
        )
        .route(
            "/vaults/{vault_id}/sources/{source_id}",
            delete(handlers::delete_source_handler),
        )
        .route(
            "/vaults/{vault_id}/sources/{source_id}/annotations",
            get(handlers::list_annotations_handler).post(handlers::create_annotation_handler),
        )
        .route(
            "/vaults/{vault_id}/annotations/{annotation_id}",
            delete(handlers::delete_annotation_handler),
        )
        .route(
            "/vaults/{vault_id}/uploads",
            get(handlers::list_uploads_handler).post(handlers::record_upload_handler),
        )
        .route(
            "/vaults/{vault_id}/uploads/{upload_id}",
            delete(handlers::delete_upload_handler),
        )
        .route(
            "/vaults/{vault_id}/citations",
            post(handlers::generate_citation_handler),
        )
        .route(
            "/vaults/{vault_id}/events",
            get(handlers::vault_events_handler),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
