use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapter::presenter::response::ErrorResponse;
use crate::domain::value_object::field_errors::FieldErrors;
use crate::usecase::{FormTemplateError, QueryRecordsError, RecordError};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
            errors: None,
        }
    }

    pub fn not_found(code: &str, message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn bad_request(code: &str, message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: &str, message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn internal(code: &str, message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn validation(errors: FieldErrors) -> Self {
        Self::bad_request("SYS_FORMS_VALIDATION_FAILED", "Validation failed").with_errors(errors)
    }

    pub fn invalid_page() -> Self {
        Self::not_found("SYS_FORMS_INVALID_PAGE", "Invalid page.")
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// 詳細はログにのみ出し、レスポンスには汎用メッセージを返す。
    fn internal_from(detail: &str) -> Self {
        tracing::error!(error = %detail, "unexpected failure while handling request");
        Self::internal("SYS_FORMS_INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            code: self.code,
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FormTemplateError> for AppError {
    fn from(err: FormTemplateError) -> Self {
        match err {
            FormTemplateError::NotFound(_) => {
                Self::not_found("SYS_FORMS_TEMPLATE_NOT_FOUND", "Form template not found")
            }
            FormTemplateError::Validation(errors) => Self::validation(errors),
            FormTemplateError::InvalidPage => Self::invalid_page(),
            FormTemplateError::Unauthorized => {
                Self::unauthorized("SYS_AUTH_MISSING_TOKEN", "Authentication credentials were not provided")
            }
            FormTemplateError::Internal(detail) => Self::internal_from(&detail),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::RecordNotFound(_) => {
                Self::not_found("SYS_FORMS_RECORD_NOT_FOUND", "Employee not found")
            }
            RecordError::TemplateNotFound(_) => {
                Self::not_found("SYS_FORMS_TEMPLATE_NOT_FOUND", "Form template not found")
            }
            RecordError::Validation(errors) => Self::validation(errors),
            RecordError::Unauthorized => {
                Self::unauthorized("SYS_AUTH_MISSING_TOKEN", "Authentication credentials were not provided")
            }
            RecordError::Internal(detail) => Self::internal_from(&detail),
        }
    }
}

impl From<QueryRecordsError> for AppError {
    fn from(err: QueryRecordsError) -> Self {
        match err {
            QueryRecordsError::InvalidPage => Self::invalid_page(),
            QueryRecordsError::Internal(detail) => Self::internal_from(&detail),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("SYS_FORMS_INVALID_BODY", &rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("SYS_FORMS_INVALID_ID", &rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("SYS_FORMS_INVALID_QUERY", &rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_template_not_found_maps_to_404() {
        let err: AppError = FormTemplateError::NotFound(Uuid::new_v4()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "SYS_FORMS_TEMPLATE_NOT_FOUND");
    }

    #[test]
    fn test_validation_carries_field_errors() {
        let err: AppError =
            RecordError::Validation(FieldErrors::single("field_values", "Name is required")).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.errors.as_ref().and_then(|e| e.get("field_values")),
            Some("Name is required")
        );
    }

    #[test]
    fn test_internal_hides_detail() {
        let err: AppError = QueryRecordsError::Internal("pool timed out".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("pool"));
    }
}
