pub mod pages;
pub mod render;
pub mod rest;
pub mod state;

use crate::web::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use rest::proxy_to_n8n_handler;

/// Builds the complete application router: the proxy endpoint, the two
/// server-rendered views, and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    // The proxy answers every method itself so non-POST gets a JSON 405.
    let api_routes = Router::new()
        .route("/api/proxy-to-n8n", any(proxy_to_n8n_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let page_routes = Router::new()
        .route("/", get(pages::mount_schedule_handler))
        .route(
            "/schedule/{view}",
            get(pages::show_schedule_handler).post(pages::submit_schedule_handler),
        )
        .route("/schedule/{view}/simulate", post(pages::simulate_schedule_handler))
        .route("/events", get(pages::mount_events_handler))
        .route("/events/{view}", get(pages::show_events_handler))
        .route(
            "/events/{view}/transcripts",
            post(pages::toggle_transcript_handler),
        )
        .route(
            "/events/{view}/processing",
            post(pages::request_processing_handler),
        );

    let mut app_router = Router::new().merge(api_routes).merge(page_routes);

    if let Some(origin) = app_state.config.allowed_origin.as_deref() {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([CONTENT_TYPE]);
                app_router = app_router.layer(cors);
            }
            Err(e) => warn!("Ignoring ALLOWED_ORIGIN '{}': {}", origin, e),
        }
    }

    // Merge the app router with the Swagger UI router for a complete application.
    Router::new()
        .merge(app_router.with_state(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
}
