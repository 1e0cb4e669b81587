use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::users::password::CredentialError;
use crate::users::store::StoreError;
use crate::users::token::IssuanceError;

/// Service-level failure taxonomy. Every handler returns this; it is the
/// single place where internal errors are translated into HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("no user with that email")]
    UserNotFound,
    #[error("password mismatch")]
    InvalidCredentials,
    #[error("credential encoding failed")]
    Encoding(#[from] CredentialError),
    #[error("token issuance failed")]
    Issuance(#[from] IssuanceError),
    #[error("user store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::Unavailable(e) => ApiError::StoreUnavailable(e),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::UserNotFound | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Encoding(_) | ApiError::Issuance(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message exposed to the caller. Unknown-email and wrong-password
    /// deliberately collapse into one string, and internal failures keep
    /// their detail in the logs only.
    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::DuplicateEmail => "Email already registered".into(),
            ApiError::UserNotFound | ApiError::InvalidCredentials => {
                "Invalid email or password".into()
            }
            ApiError::Encoding(_) | ApiError::Issuance(_) => "Internal server error".into(),
            ApiError::StoreUnavailable(_) => "User store unavailable, try again later".into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                message: self.public_message(),
            }),
        )
            .into_response()
    }
}
