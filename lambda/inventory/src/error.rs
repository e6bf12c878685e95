use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Response};
use serde_json::{json, Value};
use thiserror::Error as ThisError;

use crate::response::json_response;

/// Status returned when a bulk update body lacks its change field.
///
/// The deployed API has always answered 404 here, the same code it uses for a
/// missing inventory. Clients depend on it, so change it only here.
pub const MISSING_FIELD_STATUS: StatusCode = StatusCode::NOT_FOUND;

/// Failures raised by an [`InventoryStore`](crate::store::InventoryStore).
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("dynamodb request failed: {0}")]
    Backend(String),

    #[error("cannot decode attribute `{attribute}`: {reason}")]
    Decode { attribute: String, reason: String },

    #[error("cannot map inventory record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("inventory `{0}` does not exist")]
    Missing(String),

    #[error("price statement for inventory `{id}` failed: {reason}")]
    Statement { id: String, reason: String },
}

/// Everything a handler can fail with.
///
/// All variants except [`ApiError::Store`] become a JSON response; store
/// failures go back to the Lambda runtime untouched.
#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("invalid request body format : \"{0}\"")]
    Parse(String),

    #[error("request rejected with {status}: {body}")]
    Domain { status: StatusCode, body: Value },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    pub fn not_found() -> Self {
        ApiError::Domain {
            status: StatusCode::NOT_FOUND,
            body: json!({ "error": "not found" }),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        ApiError::Domain {
            status: MISSING_FIELD_STATUS,
            body: json!({ "error": format!("Miss field `{field}`") }),
        }
    }

    pub fn into_response(self) -> Result<Response<Body>, Error> {
        match self {
            ApiError::Validation(errors) => {
                json_response(StatusCode::BAD_REQUEST, &json!({ "errors": errors }))
            }
            err @ ApiError::Parse(_) => {
                json_response(StatusCode::BAD_REQUEST, &json!({ "error": err.to_string() }))
            }
            ApiError::Domain { status, body } => json_response(status, &body),
            ApiError::Store(err) => Err(err.into()),
        }
    }
}
