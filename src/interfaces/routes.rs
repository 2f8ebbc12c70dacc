use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::handlers::system;

mod api;
mod json_error;
mod pages;

/// Body limits and every route of the application. Unknown paths get an
/// HTML 404, or a JSON one under `/api`.
pub fn configure_routes(max_upload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(
            MultipartFormConfig::default()
                .total_limit(max_upload_bytes)
                .memory_limit(10 * 1024 * 1024),
        )
        // `Either` buffers the body before trying the urlencoded form
        .app_data(web::PayloadConfig::new(max_upload_bytes))
        .app_data(web::FormConfig::default().limit(1024 * 1024));

        cfg.configure(pages::config_routes);

        cfg.service(
            web::scope("/api")
                .configure(json_error::config_routes)
                .configure(api::config_routes),
        );

        cfg.default_service(web::route().to(system::not_found));
    }
}
