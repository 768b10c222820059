//! Linkage record - one member's progress through the OAuth handshake

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AccessToken, MemberId};

/// Handshake status derived from which fields are set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkageStatus {
    /// Only the state token is known
    Pending,
    /// Authorization code recorded, no token yet
    CodeBound,
    /// Access token and remote user seq no recorded (terminal)
    TokenBound,
}

impl LinkageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CodeBound => "code_bound",
            Self::TokenBound => "token_bound",
        }
    }
}

impl std::fmt::Display for LinkageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted linkage between a local member and a remote open-banking user.
///
/// Fields only ever move forward: once a code or token is set it is never
/// cleared. `state` is the exception and may be reissued until the record
/// is token-bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkageRecord {
    pub member_id: MemberId,
    pub state: String,
    pub authorization_code: Option<String>,
    pub access_token: Option<AccessToken>,
    pub remote_user_seq_no: Option<String>,
    /// Set while a token exchange holds the record
    pub exchange_started_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, 0 until first persisted
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkageRecord {
    /// New pending record for a first linkage attempt
    pub fn pending(member_id: MemberId, state: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            member_id,
            state: state.into(),
            authorization_code: None,
            access_token: None,
            remote_user_seq_no: None,
            exchange_started_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> LinkageStatus {
        match (&self.access_token, &self.remote_user_seq_no, &self.authorization_code) {
            (Some(_), Some(_), _) => LinkageStatus::TokenBound,
            (_, _, Some(_)) => LinkageStatus::CodeBound,
            _ => LinkageStatus::Pending,
        }
    }

    pub fn is_token_bound(&self) -> bool {
        self.status() == LinkageStatus::TokenBound
    }

    /// Whether another caller holds an unexpired exchange lease.
    ///
    /// A deadline past the representable range never expires.
    pub fn exchange_in_flight(&self, now: DateTime<Utc>, lease: Duration) -> bool {
        match self.exchange_started_at {
            Some(started) => started
                .checked_add_signed(lease)
                .map_or(true, |deadline| now < deadline),
            None => false,
        }
    }

    /// Replace the state token with a fresh attempt's token
    pub fn reissue_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
        self.updated_at = Utc::now();
    }

    /// Record the authorization code and take the exchange lease
    pub fn bind_code(&mut self, code: impl Into<String>, now: DateTime<Utc>) {
        self.authorization_code = Some(code.into());
        self.exchange_started_at = Some(now);
        self.updated_at = now;
    }

    /// Give the lease back after a failed exchange; the code stays recorded
    pub fn release_exchange(&mut self) {
        self.exchange_started_at = None;
        self.updated_at = Utc::now();
    }

    /// Record the exchanged token and release the lease
    pub fn bind_token(&mut self, access_token: AccessToken, remote_user_seq_no: impl Into<String>) {
        self.access_token = Some(access_token);
        self.remote_user_seq_no = Some(remote_user_seq_no.into());
        self.exchange_started_at = None;
        self.updated_at = Utc::now();
    }
}
