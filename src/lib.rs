pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::file_service::FileService;
use crate::services::storage::FileStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::access::access_info,
        api::handlers::files::list_files,
        api::handlers::files::upload_file,
        api::handlers::files::delete_file,
        api::handlers::files::view_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::FileEntry,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "Drop-box file endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub file_service: Arc<FileService>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn FileStore>, config: ServerConfig) -> Self {
        Self {
            file_service: Arc::new(FileService::new(store)),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    // Uploads may be arbitrarily large unless a limit is configured
    let upload_limit = match state.config.max_upload_size {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api/access-info", get(api::handlers::access::access_info))
        .route("/api/list", get(api::handlers::files::list_files))
        .route(
            "/api/upload",
            post(api::handlers::files::upload_file).layer(upload_limit),
        )
        .route("/api/delete", delete(api::handlers::files::delete_file))
        .route("/api/view/:fileName", get(api::handlers::files::view_file));

    if let Some(static_dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
