use std::fmt;

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};

use crate::{errors::AppError, views};

/// `AppError` rendered as an HTML page instead of a JSON body.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let body = match &self.0 {
            AppError::NotFound(message) => views::not_found_page(message),
            other => views::error_page(self.status_code().as_u16(), &other.user_message()),
        };
        html(self.status_code(), body)
    }
}

pub fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(ContentType::html())
        .body(body)
}
