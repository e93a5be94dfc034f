pub mod health;
pub mod lookups;
pub mod routers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::LgError;

/// Error response body: {"error": "message"}
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{} not found", resource),
        }
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_IMPLEMENTED,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<LgError> for ApiError {
    fn from(err: LgError) -> Self {
        match &err {
            e if e.is_caller_error() => Self::bad_request(err.to_string()),
            LgError::UnknownDevice => Self::not_found("router"),
            LgError::OperationUnknown => Self::not_implemented(err.to_string()),
            LgError::AuthFailed(_) | LgError::ConnectionFailed(_) | LgError::ExecFailed(_) => {
                tracing::warn!("Device error: {}", err);
                Self::bad_gateway(err.to_string())
            }
            _ => {
                tracing::error!("Internal error: {}", err);
                Self::internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (LgError::InvalidAddress, StatusCode::BAD_REQUEST),
            (LgError::AsPathTooLong, StatusCode::BAD_REQUEST),
            (LgError::UnknownDevice, StatusCode::NOT_FOUND),
            (LgError::OperationUnknown, StatusCode::NOT_IMPLEMENTED),
            (LgError::AuthFailed("denied".into()), StatusCode::BAD_GATEWAY),
            (LgError::ConnectionFailed("refused".into()), StatusCode::BAD_GATEWAY),
            (LgError::ExecFailed("exit status 1".into()), StatusCode::BAD_GATEWAY),
            (LgError::Template("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
