pub mod health;
pub use self::health::health;

pub mod customers;
pub use self::customers::{change_password, login, profile, register, update_profile};

use crate::credentials::AuthError;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// Map a service error to its HTTP status.
///
/// `failure` is the generic message for 5xx responses; internals are only logged.
pub(crate) fn auth_error_response(
    err: &AuthError,
    failure: &str,
) -> (StatusCode, Json<ErrorBody>) {
    match err {
        AuthError::InvalidCredentials => {
            error_body(StatusCode::UNAUTHORIZED, "Invalid email or password")
        }
        AuthError::IncorrectPassword => {
            error_body(StatusCode::UNAUTHORIZED, "Current password is incorrect")
        }
        AuthError::Validation(message) => error_body(StatusCode::BAD_REQUEST, message),
        AuthError::Conflict(message) => error_body(StatusCode::CONFLICT, message),
        AuthError::NotFound => error_body(StatusCode::NOT_FOUND, "Customer not found"),
        AuthError::Storage(_) | AuthError::Credential(_) | AuthError::Task(_) => {
            error!("{failure}: {err}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StoreError;

    #[test]
    fn status_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Validation("bad"), StatusCode::BAD_REQUEST),
            (AuthError::IncorrectPassword, StatusCode::UNAUTHORIZED),
            (AuthError::Conflict("taken"), StatusCode::CONFLICT),
            (AuthError::NotFound, StatusCode::NOT_FOUND),
            (
                AuthError::Storage(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(auth_error_response(&err, "Failed").0, status);
        }
    }

    #[test]
    fn unauthorized_messages() {
        let (_, Json(body)) = auth_error_response(&AuthError::InvalidCredentials, "Failed");
        assert_eq!(body.error, "Invalid email or password");

        let (_, Json(body)) = auth_error_response(&AuthError::IncorrectPassword, "Failed");
        assert_eq!(body.error, "Current password is incorrect");
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = AuthError::Storage(StoreError::Database(sqlx::Error::PoolTimedOut));
        let (_, Json(body)) = auth_error_response(&err, "Failed to login");
        assert_eq!(body.error, "Failed to login");
    }
}
