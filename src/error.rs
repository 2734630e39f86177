use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, error_body(msg)),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, error_body(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, error_body(msg)),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "errors": errors }),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("Internal server error".to_string()),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("Internal server error".to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

/// Field-scoped validation messages, collected across a whole request so
/// the caller sees every problem at once instead of the first one found.
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ok when no messages were collected, otherwise a 422 validation error.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_multiple_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("status", "cannot cancel a fully paid booking");
        errors.add("status", "cancelled bookings cannot be reactivated");
        errors.add("check_out_date", "must be after check-in date");

        assert!(!errors.is_empty());
        assert_eq!(errors.messages("status").len(), 2);
        assert_eq!(errors.messages("check_out_date").len(), 1);
        assert!(errors.messages("adults").is_empty());
    }

    #[test]
    fn empty_collector_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn non_empty_collector_becomes_validation_error() {
        let mut errors = FieldErrors::new();
        errors.add("check_in_date", "required");

        match errors.into_result() {
            Err(AppError::Validation(e)) => assert!(!e.is_empty()),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
