use actix_web::web;

use crate::handlers::{api, system};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/projects").route(web::get().to(api::list_projects)))
        .service(web::resource("/projects/{id}").route(web::get().to(api::get_project)))
        .service(web::resource("/health").route(web::get().to(system::health_check)));
}
