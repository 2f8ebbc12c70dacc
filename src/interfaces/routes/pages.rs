use actix_web::{error::PathError, web, HttpRequest};

use crate::{
    errors::AppError,
    handlers::{page_error::PageError, pages},
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(page_path_error));

    cfg.service(web::resource("/").route(web::get().to(pages::index)))
        .service(
            web::resource("/add_project")
                .route(web::get().to(pages::add_project_form))
                .route(web::post().to(pages::add_project)),
        )
        .service(web::resource("/project/{id}").route(web::get().to(pages::project_detail)))
        .service(
            web::resource("/project/{id}/demo_media")
                .route(web::post().to(pages::add_demo_media)),
        )
        .service(
            web::resource("/edit_project/{id}")
                .route(web::get().to(pages::edit_project_form))
                .route(web::post().to(pages::edit_project)),
        )
        .service(
            web::resource("/delete_project/{id}")
                .route(web::post().to(pages::delete_project)),
        );
}

/// Ids that are not numbers can never match a project.
fn page_path_error(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    PageError(AppError::project_not_found()).into()
}
