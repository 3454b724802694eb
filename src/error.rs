// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::PoolError;

/// Field-level validation failures, accumulated before an operation runs.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn the accumulated failures into a result.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("conflicting concurrent update on {0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("password hashing failed")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl ApiError {
    /// Convenience constructor for a single-field validation failure.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    /// Map store-level serialization failures on a relationship edge to the
    /// conflict class instead of a generic database error.
    pub fn conflict_on(self, edge: &'static str) -> Self {
        match self {
            ApiError::Database(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::SerializationFailure,
                _,
            )) => ApiError::Conflict(edge),
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "validation failed", "fields": errors.errors })),
            )
                .into_response(),
            ApiError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Conflict(_) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            other => {
                error!("Internal error while handling request: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_accumulate_fields() {
        let empty = ValidationErrors::new();
        assert!(empty.into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("content", "must not be empty");
        errors.add("email", "must contain '@'");
        assert!(!errors.is_empty());
        match errors.into_result() {
            Err(ApiError::Validation(e)) => {
                assert_eq!(e.errors.len(), 2);
                assert_eq!(e.errors[0].field, "content");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn errors_map_to_expected_status_codes() {
        let cases = [
            (ApiError::NotFound("post"), StatusCode::NOT_FOUND),
            (
                ApiError::invalid("content", "must not be empty"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Forbidden("only the author may edit a post"),
                StatusCode::FORBIDDEN,
            ),
            (ApiError::Conflict("follow edge"), StatusCode::CONFLICT),
            (
                ApiError::Database(diesel::result::Error::BrokenTransactionManager),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn serialization_failures_become_edge_conflicts() {
        let err = ApiError::Database(diesel::result::Error::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_string()),
        ));
        match err.conflict_on("like edge") {
            ApiError::Conflict(edge) => assert_eq!(edge, "like edge"),
            other => panic!("expected conflict, got {:?}", other),
        }

        let not_found = ApiError::NotFound("post");
        assert!(matches!(
            not_found.conflict_on("like edge"),
            ApiError::NotFound("post")
        ));
    }
}
