use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LeaveError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(detail) => LeaveError::Duplicate(detail),
            other => LeaveError::Storage(other),
        }
    }
}

impl LeaveError {
    pub fn validation(message: impl Into<String>) -> Self {
        LeaveError::Validation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "ValidationError",
            LeaveError::NotFound(_) => "NotFoundError",
            LeaveError::Duplicate(_) => "DuplicateError",
            LeaveError::Forbidden(_) => "ForbiddenError",
            LeaveError::Storage(_) => "StorageError",
        }
    }
}

/// JSON body returned for every failed leave operation.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({ "message": "end date before start date", "kind": "ValidationError" }))]
pub struct ErrorBody {
    pub message: String,
    pub kind: String,
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Duplicate(_) => StatusCode::CONFLICT,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Storage(e) => {
                tracing::error!(error = %e, "Leave storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message,
            kind: self.kind().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn storage_details_are_not_leaked() {
        let err = LeaveError::from(StoreError::Unavailable("connection refused at 10.0.0.3".into()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "StorageError");
        assert_eq!(json["message"], "Internal Server Error");
    }

    #[test]
    fn duplicate_store_errors_keep_their_kind() {
        let err = LeaveError::from(StoreError::Duplicate("leave_balances.uniq".into()));
        assert_eq!(err.kind(), "DuplicateError");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = LeaveError::validation("end date before start date");
        assert_eq!(err.to_string(), "end date before start date");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
