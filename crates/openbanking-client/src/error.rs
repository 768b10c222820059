//! Gateway error types

use thiserror::Error;

/// Longest remote body kept for diagnosis
pub const MAX_ERROR_BODY: usize = 2048;

/// Errors from a single remote call. Business-level `rsp_code` values on a
/// 2xx response are not errors and are passed through to the caller.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Remote answered with a non-success HTTP status
    #[error("Remote returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Success status but the body did not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub(crate) fn remote(status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        Self::Remote { status, body }
    }

    /// HTTP status of a remote rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_body_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY + 100);
        let err = GatewayError::remote(500, &body);
        match err {
            GatewayError::Remote { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY + 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_only_for_remote() {
        assert_eq!(GatewayError::remote(401, "denied").status(), Some(401));
        assert_eq!(GatewayError::Transport("reset".into()).status(), None);
    }
}
