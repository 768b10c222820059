//! Open banking error types
//!
//! Every failure carries the stage it happened at so callers can tell a
//! rejected callback from a remote outage from a storage problem. Remote
//! business codes (`rsp_code`) are data, not errors, and never appear here.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use openbanking_client::GatewayError;
use openbanking_db::DbError;
use openbanking_types::MemberId;

/// Result type alias for open banking operations
pub type OpenBankingResult<T> = Result<T, OpenBankingError>;

/// Where in the flow a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Request,
    LinkageLookup,
    Linkage,
    TokenExchange,
    UserInfo,
    Deposit,
    Withdraw,
    InquiryReceive,
    Persistence,
    Configuration,
    Disabled,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::LinkageLookup => "linkage_lookup",
            Self::Linkage => "linkage",
            Self::TokenExchange => "token_exchange",
            Self::UserInfo => "user_info",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::InquiryReceive => "inquiry_receive",
            Self::Persistence => "persistence",
            Self::Configuration => "configuration",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum OpenBankingError {
    // =========================================================================
    // Linkage Errors
    // =========================================================================
    /// Callback state matches no linkage attempt (expired, superseded or forged)
    #[error("No linkage attempt matches the callback state")]
    LinkageNotFound { state: String },

    /// Another callback holds the token exchange for this state
    #[error("Token exchange already in progress for this linkage")]
    LinkageInProgress { state: String },

    /// The member is already linked; a new state cannot replace it
    #[error("Linkage already completed for {member_id}")]
    LinkageAlreadyCompleted { member_id: MemberId },

    // =========================================================================
    // Remote Errors
    // =========================================================================
    #[error("Remote call failed at {stage}: {source}")]
    RemoteCallFailed {
        stage: FailureStage,
        source: GatewayError,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] DbError),

    #[error("Open banking is disabled: {operation}")]
    FeatureDisabled { operation: &'static str },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OpenBankingError {
    pub(crate) fn remote(stage: FailureStage, source: GatewayError) -> Self {
        Self::RemoteCallFailed { stage, source }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Stage the failure is attributed to
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::LinkageNotFound { .. } => FailureStage::LinkageLookup,
            Self::LinkageInProgress { .. } | Self::LinkageAlreadyCompleted { .. } => {
                FailureStage::Linkage
            }
            Self::RemoteCallFailed { stage, .. } => *stage,
            Self::PersistenceFailure(_) => FailureStage::Persistence,
            Self::FeatureDisabled { .. } => FailureStage::Disabled,
            Self::InvalidRequest(_) => FailureStage::Request,
            Self::Config(_) => FailureStage::Configuration,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::LinkageNotFound { .. } => 404,
            Self::LinkageInProgress { .. } | Self::LinkageAlreadyCompleted { .. } => 409,
            Self::RemoteCallFailed { .. } => 502,
            Self::FeatureDisabled { .. } => 503,
            Self::PersistenceFailure(_) | Self::Config(_) => 500,
        }
    }

    /// Get an error code for the client (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LinkageNotFound { .. } => "LINKAGE_NOT_FOUND",
            Self::LinkageInProgress { .. } => "LINKAGE_IN_PROGRESS",
            Self::LinkageAlreadyCompleted { .. } => "LINKAGE_ALREADY_COMPLETED",
            Self::RemoteCallFailed { .. } => "REMOTE_CALL_FAILED",
            Self::PersistenceFailure(_) => "INTERNAL_ERROR",
            Self::FeatureDisabled { .. } => "FEATURE_DISABLED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Config(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::PersistenceFailure(_) | Self::Config(_) => "An internal error occurred".to_string(),
            Self::RemoteCallFailed { stage, source } => match source.status() {
                Some(status) => format!("Remote call failed at {}: HTTP {}", stage, status),
                None => format!("Remote call failed at {}", stage),
            },
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        let err = OpenBankingError::LinkageNotFound { state: "s1".into() };
        assert_eq!(err.stage(), FailureStage::LinkageLookup);
        assert_eq!(err.status_code(), 404);

        let err = OpenBankingError::remote(
            FailureStage::TokenExchange,
            GatewayError::Transport("reset".into()),
        );
        assert_eq!(err.stage(), FailureStage::TokenExchange);
        assert_eq!(err.status_code(), 502);

        let err: OpenBankingError = DbError::Conflict("m1".into()).into();
        assert_eq!(err.stage(), FailureStage::Persistence);
    }

    #[test]
    fn test_client_message_hides_internals() {
        let err: OpenBankingError = DbError::Connection("postgres://user:pw@host".into()).into();
        assert_eq!(err.client_message(), "An internal error occurred");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_remote_message_omits_body() {
        let err = OpenBankingError::remote(
            FailureStage::Deposit,
            GatewayError::Remote {
                status: 401,
                body: "{\"token\":\"t1\"}".into(),
            },
        );
        assert_eq!(err.client_message(), "Remote call failed at deposit: HTTP 401");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;
        let err = OpenBankingError::remote(
            FailureStage::UserInfo,
            GatewayError::Decode("eof".into()),
        );
        assert!(err.source().is_some());
    }
}
