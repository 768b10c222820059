//! Credential store contract

use async_trait::async_trait;
use openbanking_types::{LinkageRecord, MemberId};

use crate::DbResult;

/// Persistence for linkage records.
///
/// Absence is reported as `Ok(None)`. `save` is an atomic, version-guarded
/// upsert keyed by member:
///
/// - `version == 0` inserts, and fails with `DbError::Conflict` if the member
///   already has a record.
/// - otherwise the stored record is replaced only if its version still equals
///   `record.version`; a stale version fails with `DbError::Conflict`.
/// - a `state` owned by a different member fails with `DbError::Duplicate`.
///
/// The persisted record is returned with its version incremented.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_member_id(&self, member_id: &MemberId) -> DbResult<Option<LinkageRecord>>;

    async fn find_by_state(&self, state: &str) -> DbResult<Option<LinkageRecord>>;

    async fn save(&self, record: &LinkageRecord) -> DbResult<LinkageRecord>;
}
