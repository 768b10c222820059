//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use openbanking_types::{AccessToken, LinkageRecord, MemberId};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `open_banking_members`
#[derive(Debug, Clone, FromRow)]
pub struct DbOpenBankingMember {
    pub member_id: Uuid,
    pub state: String,
    pub authorization_code: Option<String>,
    pub access_token: Option<String>,
    pub user_seq_no: Option<String>,
    pub exchange_started_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbOpenBankingMember> for LinkageRecord {
    fn from(row: DbOpenBankingMember) -> Self {
        Self {
            member_id: MemberId::from_uuid(row.member_id),
            state: row.state,
            authorization_code: row.authorization_code,
            access_token: row.access_token.map(AccessToken::new),
            remote_user_seq_no: row.user_seq_no,
            exchange_started_at: row.exchange_started_at,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
