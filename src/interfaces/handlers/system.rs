use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use tracing::warn;

use crate::{
    handlers::{json_error::json_error, page_error::html},
    views, AppState,
};

/// Reports database and object store reachability. Unhealthy answers 500
/// so load balancers take the instance out.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = state.project_handler.health().await;

    if response.is_healthy() {
        HttpResponse::Ok().json(response)
    } else {
        warn!("Health check failed: {:?}", response.error);
        HttpResponse::InternalServerError().json(response)
    }
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    if req.path().starts_with("/api") {
        json_error(StatusCode::NOT_FOUND, "Not found", req.path())
    } else {
        html(StatusCode::NOT_FOUND, views::not_found_page("Page not found"))
    }
}
