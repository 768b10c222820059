//! Linkage repository (PostgreSQL)

use async_trait::async_trait;
use sqlx::PgPool;

use openbanking_types::{LinkageRecord, MemberId};

use crate::{CredentialStore, DbError, DbOpenBankingMember, DbResult};

const STATE_CONSTRAINT: &str = "open_banking_members_state_key";

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct LinkageRepo {
    pool: PgPool,
}

impl LinkageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, record: &LinkageRecord) -> DbResult<Option<DbOpenBankingMember>> {
        sqlx::query_as::<_, DbOpenBankingMember>(
            r#"
            INSERT INTO open_banking_members
                (member_id, state, authorization_code, access_token, user_seq_no,
                 exchange_started_at, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, NOW())
            ON CONFLICT (member_id) DO NOTHING
            RETURNING *
            "#
        )
        .bind(record.member_id.as_uuid())
        .bind(&record.state)
        .bind(&record.authorization_code)
        .bind(record.access_token.as_ref().map(|t| t.as_str()))
        .bind(&record.remote_user_seq_no)
        .bind(record.exchange_started_at)
        .bind(record.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_state_violation(e, &record.state))
    }

    async fn update(&self, record: &LinkageRecord) -> DbResult<Option<DbOpenBankingMember>> {
        sqlx::query_as::<_, DbOpenBankingMember>(
            r#"
            UPDATE open_banking_members
            SET state = $2,
                authorization_code = $3,
                access_token = $4,
                user_seq_no = $5,
                exchange_started_at = $6,
                version = version + 1,
                updated_at = NOW()
            WHERE member_id = $1 AND version = $7
            RETURNING *
            "#
        )
        .bind(record.member_id.as_uuid())
        .bind(&record.state)
        .bind(&record.authorization_code)
        .bind(record.access_token.as_ref().map(|t| t.as_str()))
        .bind(&record.remote_user_seq_no)
        .bind(record.exchange_started_at)
        .bind(record.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_state_violation(e, &record.state))
    }
}

fn map_state_violation(e: sqlx::Error, state: &str) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.constraint() == Some(STATE_CONSTRAINT) {
            return DbError::Duplicate(format!("state {} is bound to another member", state));
        }
    }
    DbError::Query(e)
}

#[async_trait]
impl CredentialStore for LinkageRepo {
    async fn find_by_member_id(&self, member_id: &MemberId) -> DbResult<Option<LinkageRecord>> {
        let row = sqlx::query_as::<_, DbOpenBankingMember>(
            "SELECT * FROM open_banking_members WHERE member_id = $1"
        )
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LinkageRecord::from))
    }

    async fn find_by_state(&self, state: &str) -> DbResult<Option<LinkageRecord>> {
        let row = sqlx::query_as::<_, DbOpenBankingMember>(
            "SELECT * FROM open_banking_members WHERE state = $1"
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LinkageRecord::from))
    }

    async fn save(&self, record: &LinkageRecord) -> DbResult<LinkageRecord> {
        let row = if record.version == 0 {
            self.insert(record).await?
        } else {
            self.update(record).await?
        };

        row.map(LinkageRecord::from).ok_or_else(|| {
            DbError::Conflict(format!(
                "linkage for {} changed since version {}",
                record.member_id, record.version
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DatabaseConfig};
    use openbanking_types::AccessToken;

    async fn repo() -> LinkageRepo {
        let db = Database::connect(&DatabaseConfig::from_env()).await.unwrap();
        db.migrate().await.unwrap();
        db.linkage_repo()
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
    async fn test_versioned_upsert_against_postgres() {
        let repo = repo().await;
        let member = MemberId::new();
        let state = format!("state-{}", member.as_uuid());

        let stored = repo.save(&LinkageRecord::pending(member, state.clone())).await.unwrap();
        assert_eq!(stored.version, 1);

        // A second insert for the same member loses
        let dup = repo.save(&LinkageRecord::pending(member, "other")).await;
        assert!(dup.unwrap_err().is_conflict());

        let mut next = stored.clone();
        next.bind_token(AccessToken::new("t1"), "u1");
        let bound = repo.save(&next).await.unwrap();
        assert_eq!(bound.version, 2);

        // Stale version is rejected
        assert!(repo.save(&next).await.unwrap_err().is_conflict());

        let found = repo.find_by_state(&state).await.unwrap().unwrap();
        assert_eq!(found.remote_user_seq_no.as_deref(), Some("u1"));
    }
}
