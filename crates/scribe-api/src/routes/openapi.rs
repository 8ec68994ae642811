use axum::Json;
use utoipa::OpenApi;

use crate::handlers::generate::{self, GenerateRequest};
use crate::routes::health::{self, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(generate::generate, health::health_check),
    components(schemas(GenerateRequest, HealthResponse)),
    tags(
        (name = "generate", description = "Transcript to streamed completion"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
