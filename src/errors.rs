use std::borrow::Cow;
use std::fmt;

use actix_multipart::MultipartError;
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    NotFound(String),
    Storage(StorageError),
    DatabaseError(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Validation error: {}", messages)
            }
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Storage(err) => write!(f, "Storage error: {}", err),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn project_not_found() -> Self {
        AppError::NotFound("Project not found".to_string())
    }

    /// Message suitable for a flash banner on an HTML page.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => errors.iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join(" "),
            _ => self.to_string(),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23503")) => {
                AppError::project_not_found()
            }
            _ => AppError::DatabaseError(err.to_string())
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::field("form", err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Failures talking to the object store. These never abort a database
/// write; callers log them and carry on without the file.
#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Request to object store failed: {_0}")]
    Request(String),

    #[display("Object store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[display("Empty file")]
    EmptyFile,

    #[display("Invalid storage configuration: {_0}")]
    Configuration(String),
}

impl std::error::Error for StorageError {}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Request(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
    }

    #[test]
    fn validation_errors_keep_field_names() {
        let err: AppError = Form { title: String::new() }.validate().unwrap_err().into();
        match &err {
            AppError::ValidationError(errors) => {
                assert_eq!(errors, &vec![FieldError { field: "title".into(), message: "Title is required".into() }]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "Title is required");
    }

    #[derive(Validate)]
    struct Unlabelled {
        #[validate(length(max = 3))]
        code: String,
    }

    #[test]
    fn validation_errors_without_a_message_name_the_field() {
        let err: AppError = Unlabelled { code: "toolong".into() }.validate().unwrap_err().into();
        assert_eq!(err.user_message(), "Invalid value for code");
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::project_not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DatabaseError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::from(StorageError::EmptyFile).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::from(sqlx::Error::RowNotFound).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_found_message_is_the_json_error() {
        assert_eq!(AppError::project_not_found().to_string(), "Project not found");
    }
}
