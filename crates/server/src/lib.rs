pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Instance Resize API",
        version = "0.1.0",
        description = "Stop, reconfigure and restart cloud instances with streamed progress"
    ),
    paths(
        routes::health_check,
        routes::list_instances,
        routes::get_instance_status,
        routes::list_instance_types,
        routes::list_open_addresses,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::InstanceStatusResponse,
        resize_core::Address,
        resize_core::InstanceState,
        resize_core::InstanceSummary,
        resize_core::InstanceType,
        resize_core::MutationSpec,
        events::ProgressEvent,
        events::FailureCause,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "instances", description = "Instance and instance type endpoints"),
        (name = "addresses", description = "Elastic address endpoints"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/instances", get(routes::list_instances))
        .route("/api/instance-types", get(routes::list_instance_types))
        .route(
            "/api/instances/{id}/status",
            get(routes::get_instance_status),
        )
        .route("/api/instances/{id}/resize", get(routes::resize_socket))
        .route("/api/instances/{id}/address", get(routes::address_socket))
        .route("/api/addresses", get(routes::list_open_addresses))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
