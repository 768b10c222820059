//! In-memory credential store for development and tests

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use openbanking_types::{LinkageRecord, MemberId};

use crate::{CredentialStore, DbError, DbResult};

/// Dashmap-backed store.
///
/// The member shard lock is held for the whole read-compare-write in `save`,
/// and the `state` index entry is claimed inside that critical section. Lookups by
/// state never hold an index guard while touching the record map.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<MemberId, LinkageRecord>,
    by_state: DashMap<String, MemberId>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bind `state` to `member_id` in the index unless another member owns it
    fn claim_state(&self, state: &str, member_id: &MemberId) -> DbResult<()> {
        match self.by_state.entry(state.to_string()) {
            Entry::Occupied(owner) if owner.get() != member_id => Err(DbError::Duplicate(
                format!("state {} is bound to another member", state),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(*member_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_member_id(&self, member_id: &MemberId) -> DbResult<Option<LinkageRecord>> {
        Ok(self.records.get(member_id).map(|r| r.value().clone()))
    }

    async fn find_by_state(&self, state: &str) -> DbResult<Option<LinkageRecord>> {
        let member_id = match self.by_state.get(state).map(|r| *r.value()) {
            Some(id) => id,
            None => return Ok(None),
        };
        // The index may briefly point at a superseded state
        Ok(self
            .records
            .get(&member_id)
            .filter(|r| r.value().state == state)
            .map(|r| r.value().clone()))
    }

    async fn save(&self, record: &LinkageRecord) -> DbResult<LinkageRecord> {
        match self.records.entry(record.member_id) {
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.version != record.version {
                    return Err(DbError::Conflict(format!(
                        "linkage for {} is at version {}, not {}",
                        record.member_id, current.version, record.version
                    )));
                }
                self.claim_state(&record.state, &record.member_id)?;

                let previous_state = current.state.clone();
                let mut stored = record.clone();
                stored.version = current.version + 1;
                stored.updated_at = Utc::now();

                if previous_state != stored.state {
                    self.by_state.remove(&previous_state);
                }
                slot.insert(stored.clone());
                Ok(stored)
            }
            Entry::Vacant(slot) => {
                if record.version != 0 {
                    return Err(DbError::Conflict(format!(
                        "linkage for {} does not exist at version {}",
                        record.member_id, record.version
                    )));
                }
                self.claim_state(&record.state, &record.member_id)?;

                let mut stored = record.clone();
                stored.version = 1;
                stored.updated_at = Utc::now();

                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openbanking_types::AccessToken;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryCredentialStore::new();
        let member = MemberId::new();

        let stored = store.save(&LinkageRecord::pending(member, "s1")).await.unwrap();
        assert_eq!(stored.version, 1);

        let by_member = store.find_by_member_id(&member).await.unwrap().unwrap();
        let by_state = store.find_by_state("s1").await.unwrap().unwrap();
        assert_eq!(by_member, by_state);
        assert!(store.find_by_state("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = InMemoryCredentialStore::new();
        let member = MemberId::new();
        let stored = store.save(&LinkageRecord::pending(member, "s1")).await.unwrap();

        let mut first = stored.clone();
        first.bind_code("c1", Utc::now());
        store.save(&first).await.unwrap();

        let mut second = stored;
        second.bind_code("c2", Utc::now());
        assert!(store.save(&second).await.unwrap_err().is_conflict());

        let current = store.find_by_member_id(&member).await.unwrap().unwrap();
        assert_eq!(current.authorization_code.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_second_insert_for_member_conflicts() {
        let store = InMemoryCredentialStore::new();
        let member = MemberId::new();
        store.save(&LinkageRecord::pending(member, "s1")).await.unwrap();

        let err = store.save(&LinkageRecord::pending(member, "s2")).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reissued_state_drops_old_index() {
        let store = InMemoryCredentialStore::new();
        let member = MemberId::new();
        let mut record = store.save(&LinkageRecord::pending(member, "s1")).await.unwrap();

        record.reissue_state("s2");
        store.save(&record).await.unwrap();

        assert!(store.find_by_state("s1").await.unwrap().is_none());
        assert_eq!(store.find_by_state("s2").await.unwrap().unwrap().member_id, member);
    }

    #[tokio::test]
    async fn test_state_owned_by_other_member_is_rejected() {
        let store = InMemoryCredentialStore::new();
        store.save(&LinkageRecord::pending(MemberId::new(), "s1")).await.unwrap();

        let err = store
            .save(&LinkageRecord::pending(MemberId::new(), "s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_single_winner() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let member = MemberId::new();
        let base = store.save(&LinkageRecord::pending(member, "s1")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let mut attempt = base.clone();
            handles.push(tokio::spawn(async move {
                attempt.bind_token(AccessToken::new(format!("t{}", i)), "u1");
                store.save(&attempt).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.find_by_member_id(&member).await.unwrap().unwrap().version, 2);
    }
}
