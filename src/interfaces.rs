pub mod flash;
pub mod handlers;
pub mod middlewares;
pub mod repositories;
pub mod routes;
pub mod views;
