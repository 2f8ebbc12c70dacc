use actix_cors::Cors;
use actix_web::http::{header, Method};
use tracing::warn;

use crate::settings::AppConfig;

/// CORS for the JSON API. `*` in the origin list allows any origin and is
/// rejected by config validation in production.
pub fn build_cors(config: &AppConfig) -> Cors {
    let origins = config.cors_origins();

    let cors = if origins.iter().any(|o| o == "*") {
        warn!("CORS: permissive mode, all origins allowed");
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(3600)
}
