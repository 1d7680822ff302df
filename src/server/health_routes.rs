use super::state::AppState;
use axum::{routing, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

#[derive(OpenApi)]
#[openapi(paths(serve_health), components(schemas(HealthReport)), tags((name = "health")))]
pub struct HealthApiDoc;

pub fn api() -> Router<AppState> {
    Router::new().route("/", routing::get(serve_health))
}

#[derive(Debug, Clone, PartialEq, Eq, ToSchema, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/",
    context_path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthReport)),
)]
async fn serve_health() -> Json<HealthReport> {
    Json(HealthReport {
        status: "success".to_string(),
        message: "Weather service is up".to_string(),
    })
}
