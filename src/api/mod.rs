pub mod auth;
pub mod blocks;
pub mod catalog;
pub mod handlers;
pub mod projects;
pub mod types;
pub mod zero_blocks;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use sea_orm::DatabaseConnection;

use crate::access::{AccessGate, DbAccessGate};
use crate::config::ServerConfig;
use crate::services::{BlockService, CatalogService, ProjectService, ZeroBlockService};
use auth::AuthManager;

/// Application state shared across handlers
pub struct AppState {
    pub auth: AuthManager,
    pub projects: ProjectService,
    pub catalog: CatalogService,
    pub blocks: BlockService,
    pub zero_blocks: ZeroBlockService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: &ServerConfig) -> Self {
        let gate: Arc<dyn AccessGate> = Arc::new(DbAccessGate::new(db.clone()));

        Self {
            auth: AuthManager::new(db.clone(), config.token_ttl),
            projects: ProjectService::new(db.clone(), gate.clone()),
            catalog: CatalogService::new(db.clone()),
            blocks: BlockService::new(db.clone(), gate.clone()),
            zero_blocks: ZeroBlockService::new(db, gate),
        }
    }
}

/// Create the JSON API router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        // Auth
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/logout", post(handlers::logout))
        // Projects and pages
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route("/api/projects/:project_id", get(projects::get_project))
        .route(
            "/api/projects/:project_id/pages",
            post(projects::create_page).get(projects::list_pages),
        )
        .route(
            "/api/pages/:page_id",
            get(projects::get_page).delete(projects::delete_page),
        )
        // Catalogs
        .route(
            "/api/block-templates",
            post(catalog::create_template).get(catalog::list_templates),
        )
        .route("/api/block-templates/:template_id", get(catalog::get_template))
        .route(
            "/api/zero-base-elements",
            post(catalog::create_element).get(catalog::list_elements),
        )
        .route("/api/zero-base-elements/:element_id", get(catalog::get_element))
        // Blocks
        .route(
            "/api/pages/:page_id/blocks",
            get(blocks::list_blocks).post(blocks::create_block),
        )
        .route("/api/pages/:page_id/blocks/count", get(blocks::count_blocks))
        .route("/api/pages/:page_id/blocks/order", put(blocks::reorder_blocks))
        .route(
            "/api/blocks/:block_id",
            get(blocks::get_block)
                .patch(blocks::update_block)
                .delete(blocks::delete_block),
        )
        .route("/api/blocks/:block_id/position", patch(blocks::update_block_position))
        .route(
            "/api/blocks/:block_id/zero-block",
            post(zero_blocks::create_zero_block).get(zero_blocks::get_zero_block_for_block),
        )
        // Zero-blocks
        .route(
            "/api/zero-blocks/:zero_block_id",
            get(zero_blocks::get_zero_block).delete(zero_blocks::delete_zero_block),
        )
        .route(
            "/api/zero-blocks/:zero_block_id/layers",
            get(zero_blocks::list_layers).post(zero_blocks::create_layer),
        )
        .route(
            "/api/zero-blocks/:zero_block_id/responsive",
            get(zero_blocks::list_block_responsive).post(zero_blocks::create_block_responsive),
        )
        .route(
            "/api/zero-layers/:layer_id",
            get(zero_blocks::get_layer)
                .patch(zero_blocks::update_layer)
                .delete(zero_blocks::delete_layer),
        )
        .route("/api/zero-layers/:layer_id/position", patch(zero_blocks::move_layer))
        .route(
            "/api/zero-layers/:layer_id/responsive",
            get(zero_blocks::list_layer_responsive).post(zero_blocks::create_layer_responsive),
        )
        .route(
            "/api/zero-block-responsive/:responsive_id",
            get(zero_blocks::get_block_responsive)
                .patch(zero_blocks::update_block_responsive)
                .put(zero_blocks::replace_block_responsive)
                .delete(zero_blocks::delete_block_responsive),
        )
        .route(
            "/api/zero-layer-responsive/:responsive_id",
            get(zero_blocks::get_layer_responsive)
                .patch(zero_blocks::update_layer_responsive)
                .delete(zero_blocks::delete_layer_responsive),
        )
}
