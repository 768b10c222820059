//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use openbanking_core::OpenBankingError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    OpenBanking(#[from] OpenBankingError),

    #[error("Missing or malformed bearer token")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::OpenBanking(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error body returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub msg: String,
    /// Stage the failure is attributed to
    pub stage: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::OpenBanking(e) => Self {
                code: e.error_code().to_string(),
                msg: e.client_message(),
                stage: e.stage().to_string(),
            },
            ApiError::Unauthorized => Self {
                code: "UNAUTHORIZED".to_string(),
                msg: err.to_string(),
                stage: "request".to_string(),
            },
            ApiError::BadRequest(_) => Self {
                code: "INVALID_REQUEST".to_string(),
                msg: err.to_string(),
                stage: "request".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::OpenBanking(e) = &self {
            if e.is_server_error() {
                tracing::error!(stage = %e.stage(), error = %e, "Request failed");
            } else {
                tracing::debug!(stage = %e.stage(), error = %e, "Request rejected");
            }
        }

        let status = self.status_code();
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_maps_to_unavailable() {
        let err = ApiError::from(OpenBankingError::FeatureDisabled {
            operation: "deposit",
        });
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, "FEATURE_DISABLED");
        assert_eq!(body.stage, "disabled");
    }

    #[test]
    fn test_unauthorized_body() {
        let body = ErrorResponse::from(&ApiError::Unauthorized);
        assert_eq!(body.code, "UNAUTHORIZED");
        assert_eq!(body.stage, "request");
    }
}
