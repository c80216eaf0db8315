use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::error;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use coursehub_config::StorageBackend;
use coursehub_core::{ApiResponse, MessageResponse};

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::cart::router::init_cart_router;
use crate::modules::comments::router::{init_comment_router, init_comments_router};
use crate::modules::courses::router::{init_course_router, init_courses_router};
use crate::modules::educators::router::{init_educator_router, init_educators_directory_router};
use crate::modules::likes::router::{init_likes_router, init_total_likes_router};
use crate::modules::orders::router::init_order_router;
use crate::modules::users::router::{init_user_router, init_users_directory_router};
use crate::state::AppState;

/// Room for the multipart envelope and text fields around the files.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

async fn root() -> &'static str {
    "API IS WORKING"
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up", body = MessageResponse)),
    tag = "System"
)]
pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("OK"))
}

#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Database reachable", body = MessageResponse),
        (status = 503, description = "Database unreachable", body = MessageResponse)
    ),
    tag = "System"
)]
pub async fn ready(State(state): State<AppState>) -> Response {
    match coursehub_db::ping(&state.db).await {
        Ok(()) => Json(ApiResponse::message("Ready")).into_response(),
        Err(e) => {
            error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "success": false, "message": "Database unavailable" })),
            )
                .into_response()
        }
    }
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    // A profile form can carry two files.
    let body_limit = state.storage_config.max_upload_bytes * 2 + FORM_OVERHEAD_BYTES;

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest(
            "/api",
            Router::new()
                .nest("/user", init_user_router())
                .nest("/users", init_users_directory_router())
                .nest("/educator", init_educator_router())
                .nest("/educators-list", init_educators_directory_router())
                .nest("/course", init_course_router())
                .nest("/courses", init_courses_router())
                .nest("/comment", init_comment_router())
                .nest("/comments", init_comments_router())
                .nest("/likes", init_likes_router())
                .nest("/total-likes", init_total_likes_router())
                .nest("/cart", init_cart_router())
                .nest("/order", init_order_router()),
        );

    if state.storage_config.backend == StorageBackend::Local {
        router = router.nest_service("/files", ServeDir::new(&state.storage_config.local_dir));
    }

    router
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
