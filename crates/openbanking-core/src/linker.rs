//! Authorization linker - the OAuth state/code handshake
//!
//! ```text
//! begin_linkage(state, member)      complete_linkage(state, code)
//!          │                                  │
//!          ▼                                  ▼
//!      PENDING ──── claim (code + lease) ──► CODE_BOUND ──── exchange ok ──► TOKEN_BOUND
//!          ▲                                  │
//!          └──── new state (supersede) ───────┤ exchange failed: lease released,
//!                                             │ same state may retry
//! ```
//!
//! No lock is held across the remote call. The claim is a versioned save, so
//! two callbacks racing on one state cannot both reach the token exchange.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use openbanking_client::{AuthTokenResponse, GatewayError, RemoteBankingGateway};
use openbanking_db::{CredentialStore, DbError};
use openbanking_types::{AccessToken, LinkageRecord, MemberId};

use crate::config::ClientCredentials;
use crate::error::{FailureStage, OpenBankingError, OpenBankingResult};

/// Re-read attempts when a begin races another writer for the same member
const MAX_SAVE_ATTEMPTS: usize = 8;

/// Token held for a linked member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub member_id: MemberId,
    pub access_token: AccessToken,
    pub user_seq_no: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<AccessToken>,
    pub scope: Option<String>,
    /// False when an earlier callback already completed the linkage
    pub newly_issued: bool,
}

impl AuthToken {
    /// Token already stored on a token-bound record
    pub fn stored(record: &LinkageRecord) -> Option<Self> {
        match (&record.access_token, &record.remote_user_seq_no) {
            (Some(access_token), Some(user_seq_no)) => Some(Self {
                member_id: record.member_id,
                access_token: access_token.clone(),
                user_seq_no: user_seq_no.clone(),
                token_type: None,
                expires_in: None,
                refresh_token: None,
                scope: None,
                newly_issued: false,
            }),
            _ => None,
        }
    }

    fn issued(member_id: MemberId, response: AuthTokenResponse) -> Self {
        Self {
            member_id,
            access_token: AccessToken::new(response.access_token),
            user_seq_no: response.user_seq_no,
            token_type: Some(response.token_type).filter(|t| !t.is_empty()),
            expires_in: response.expires_in,
            refresh_token: response.refresh_token.map(AccessToken::new),
            scope: response.scope,
            newly_issued: true,
        }
    }
}

/// Drives a member through the linkage handshake
pub struct AuthorizationLinker {
    store: Arc<dyn CredentialStore>,
    gateway: Arc<dyn RemoteBankingGateway>,
    client: ClientCredentials,
    lease: Duration,
}

impl AuthorizationLinker {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        gateway: Arc<dyn RemoteBankingGateway>,
        client: ClientCredentials,
        lease: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            client,
            lease,
        }
    }

    /// Record a linkage attempt for `member_id` under `state`.
    ///
    /// A different state supersedes the member's previous attempt. Repeating
    /// the current state returns the stored record untouched.
    ///
    /// While a token exchange holds the lease, a different state does not
    /// supersede: the call fails with `LinkageInProgress` until the exchange
    /// finishes or the lease expires.
    pub async fn begin_linkage(
        &self,
        state: &str,
        member_id: MemberId,
    ) -> OpenBankingResult<LinkageRecord> {
        if state.trim().is_empty() {
            return Err(OpenBankingError::invalid("state must not be empty"));
        }

        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let record = match self.store.find_by_member_id(&member_id).await? {
                None => LinkageRecord::pending(member_id, state),
                Some(existing) if existing.state == state => {
                    debug!(member_id = %member_id, "Linkage attempt already recorded");
                    return Ok(existing);
                }
                Some(existing) if existing.is_token_bound() => {
                    return Err(OpenBankingError::LinkageAlreadyCompleted { member_id });
                }
                Some(existing) if existing.exchange_in_flight(Utc::now(), self.lease) => {
                    return Err(OpenBankingError::LinkageInProgress {
                        state: existing.state,
                    });
                }
                Some(mut existing) => {
                    existing.reissue_state(state);
                    existing
                }
            };

            match self.store.save(&record).await {
                Ok(saved) => {
                    info!(
                        member_id = %member_id,
                        version = saved.version,
                        status = %saved.status(),
                        "Linkage attempt recorded"
                    );
                    return Ok(saved);
                }
                Err(e) if e.is_conflict() => {
                    warn!(member_id = %member_id, attempt, "Linkage write conflict, re-reading");
                }
                Err(DbError::Duplicate(_)) => {
                    return Err(OpenBankingError::invalid(
                        "state is already used by another linkage attempt",
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(member_id = %member_id, "Linkage write kept conflicting");
        Err(DbError::Conflict(format!("linkage for {}", member_id)).into())
    }

    /// Complete the handshake for a redirect callback.
    ///
    /// At most one token exchange runs per state. A repeated callback after
    /// success returns the stored token without calling out.
    pub async fn complete_linkage(&self, state: &str, code: &str) -> OpenBankingResult<AuthToken> {
        if state.trim().is_empty() || code.trim().is_empty() {
            return Err(OpenBankingError::invalid("state and code must not be empty"));
        }

        let mut record = self.find_by_state(state).await?;

        if let Some(token) = AuthToken::stored(&record) {
            debug!(member_id = %record.member_id, "Linkage already completed");
            return Ok(token);
        }

        let now = Utc::now();
        if record.exchange_in_flight(now, self.lease) {
            return Err(OpenBankingError::LinkageInProgress {
                state: state.to_string(),
            });
        }

        // Claim
        record.bind_code(code, now);
        let claimed = match self.store.save(&record).await {
            Ok(saved) => saved,
            Err(e) if e.is_conflict() => {
                warn!(member_id = %record.member_id, "Lost linkage claim race");
                let current = self.find_by_state(state).await?;
                return match AuthToken::stored(&current) {
                    Some(token) => Ok(token),
                    None => Err(OpenBankingError::LinkageInProgress {
                        state: state.to_string(),
                    }),
                };
            }
            Err(e) => return Err(e.into()),
        };
        info!(member_id = %claimed.member_id, "Authorization code bound, exchanging token");

        let exchanged = self
            .gateway
            .exchange_token(&self.client.token_exchange(code))
            .await
            .and_then(|resp| {
                if resp.access_token.trim().is_empty() || resp.user_seq_no.trim().is_empty() {
                    Err(GatewayError::Decode(
                        "token response without access_token or user_seq_no".to_string(),
                    ))
                } else {
                    Ok(resp)
                }
            });

        let response = match exchanged {
            Ok(response) => response,
            Err(source) => {
                error!(member_id = %claimed.member_id, error = %source, "Token exchange failed");
                self.release(claimed).await;
                return Err(OpenBankingError::remote(FailureStage::TokenExchange, source));
            }
        };

        let mut bound = claimed;
        bound.bind_token(
            AccessToken::new(response.access_token.clone()),
            response.user_seq_no.clone(),
        );
        let saved = self.store.save(&bound).await.map_err(|e| {
            error!(
                member_id = %bound.member_id,
                error = %e,
                "Token exchanged but not persisted; lease expires for retry"
            );
            OpenBankingError::PersistenceFailure(e)
        })?;

        info!(
            member_id = %saved.member_id,
            user_seq_no = %response.user_seq_no,
            "Linkage completed"
        );
        Ok(AuthToken::issued(saved.member_id, response))
    }

    async fn find_by_state(&self, state: &str) -> OpenBankingResult<LinkageRecord> {
        self.store
            .find_by_state(state)
            .await?
            .ok_or_else(|| OpenBankingError::LinkageNotFound {
                state: state.to_string(),
            })
    }

    /// Give the lease back so the same state can retry right away.
    /// A failed release only delays the retry until the lease expires.
    async fn release(&self, mut record: LinkageRecord) {
        record.release_exchange();
        if let Err(e) = self.store.save(&record).await {
            warn!(member_id = %record.member_id, error = %e, "Could not release exchange lease");
        }
    }
}
