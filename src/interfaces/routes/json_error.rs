use actix_web::{
    error::{PathError, QueryPayloadError},
    http::StatusCode,
    web, HttpRequest, HttpResponse, ResponseError,
};
use serde_json::json;

/// Extractor failures under `/api` answer with a JSON body like every other API error.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req: &HttpRequest| {
        JsonError::from(err).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        JsonError::from(err).into()
    }));
}

#[derive(Debug)]
pub struct JsonError {
    message: String,
    status: StatusCode,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<PathError> for JsonError {
    fn from(_: PathError) -> Self {
        // A non-numeric id names no project
        JsonError {
            message: "Project not found".to_string(),
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl From<QueryPayloadError> for JsonError {
    fn from(err: QueryPayloadError) -> Self {
        JsonError {
            message: format!("Query error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}
