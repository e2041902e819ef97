//! In-memory store implementations
//!
//! Used in dev mode when MongoDB is unreachable, and by the test suites.
//! Kicks live in a `DashMap`, so every comment mutation happens under the
//! entry's shard lock and concurrent appends cannot lose each other.
//! Accounts sit behind one `RwLock` so the two unique keys are checked and
//! inserted in a single critical section.

use async_trait::async_trait;
use bson::oid::ObjectId;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::schemas::{
    validate_comment_text, AccountDoc, CommentDoc, KickChanges, KickDoc, EMAIL_INDEX, HANDLE_INDEX,
};
use crate::db::{AccountStore, KickStore, StoreError, StoreResult};

/// In-memory account directory
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<ObjectId, AccountDoc>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_account(&self, mut account: AccountDoc) -> StoreResult<AccountDoc> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|a| a.handle == account.handle) {
            return Err(StoreError::Duplicate {
                index: HANDLE_INDEX.to_string(),
            });
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate {
                index: EMAIL_INDEX.to_string(),
            });
        }

        let id = ObjectId::new();
        account._id = Some(id);
        account.metadata.stamp_created();
        accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<AccountDoc>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.handle == handle).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<AccountDoc>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<AccountDoc>> {
        let accounts = self.accounts.read().await;
        Ok(ids.iter().filter_map(|id| accounts.get(id).cloned()).collect())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

/// In-memory kick store
#[derive(Default)]
pub struct MemoryKickStore {
    kicks: DashMap<ObjectId, KickDoc>,
}

impl MemoryKickStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored kicks
    pub fn len(&self) -> usize {
        self.kicks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kicks.is_empty()
    }
}

#[async_trait]
impl KickStore for MemoryKickStore {
    async fn insert_kick(&self, mut kick: KickDoc) -> StoreResult<KickDoc> {
        kick.validate()?;

        let id = ObjectId::new();
        kick._id = Some(id);
        kick.metadata.stamp_created();
        self.kicks.insert(id, kick.clone());
        Ok(kick)
    }

    async fn find_kick(&self, id: &ObjectId) -> StoreResult<Option<KickDoc>> {
        Ok(self.kicks.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_by_owner(&self, owner: &ObjectId) -> StoreResult<Vec<KickDoc>> {
        let mut owned: Vec<KickDoc> = self
            .kicks
            .iter()
            .filter(|entry| &entry.value().owner == owner)
            .map(|entry| entry.value().clone())
            .collect();

        // Same order as the MongoDB sort: created_at desc, then _id desc
        owned.sort_by(|a, b| {
            b.metadata
                .created_at
                .cmp(&a.metadata.created_at)
                .then_with(|| b._id.cmp(&a._id))
        });
        Ok(owned)
    }

    async fn update_kick(
        &self,
        id: &ObjectId,
        changes: &KickChanges,
    ) -> StoreResult<Option<KickDoc>> {
        changes.validate()?;

        match self.kicks.get_mut(id) {
            Some(mut entry) => {
                let kick = entry.value_mut();
                changes.apply_to(kick);
                kick.metadata.touch();
                Ok(Some(kick.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_kick(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.kicks.remove(id).is_some())
    }

    async fn push_comment(&self, kick_id: &ObjectId, comment: CommentDoc) -> StoreResult<bool> {
        comment.validate()?;

        match self.kicks.get_mut(kick_id) {
            Some(mut entry) => {
                entry.value_mut().comments.push(comment);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_comment_text(
        &self,
        kick_id: &ObjectId,
        comment_id: &ObjectId,
        text: &str,
    ) -> StoreResult<Option<CommentDoc>> {
        validate_comment_text(text)?;

        let Some(mut entry) = self.kicks.get_mut(kick_id) else {
            return Ok(None);
        };
        let comment = entry
            .value_mut()
            .comments
            .iter_mut()
            .find(|c| &c._id == comment_id);

        Ok(comment.map(|c| {
            c.text = text.to_string();
            c.metadata.touch();
            c.clone()
        }))
    }

    async fn pull_comment(&self, kick_id: &ObjectId, comment_id: &ObjectId) -> StoreResult<bool> {
        let Some(mut entry) = self.kicks.get_mut(kick_id) else {
            return Ok(false);
        };
        let comments = &mut entry.value_mut().comments;
        let before = comments.len();
        comments.retain(|c| &c._id != comment_id);
        Ok(comments.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{Category, KickStatus};
    use std::sync::Arc;

    fn account(handle: &str, email: &str) -> AccountDoc {
        AccountDoc::new(handle.into(), "Test".into(), email.into(), "$argon2id$stub".into())
    }

    #[tokio::test]
    async fn test_account_uniqueness_enforced_by_store() {
        let store = MemoryAccountStore::new();
        store.create_account(account("ada", "ada@example.com")).await.unwrap();

        let dup_handle = store.create_account(account("ada", "other@example.com")).await;
        assert_eq!(
            dup_handle,
            Err(StoreError::Duplicate {
                index: HANDLE_INDEX.to_string()
            })
        );

        let dup_email = store.create_account(account("grace", "ada@example.com")).await;
        assert_eq!(
            dup_email,
            Err(StoreError::Duplicate {
                index: EMAIL_INDEX.to_string()
            })
        );

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let store = MemoryKickStore::new();
        let owner = ObjectId::new();
        let other = ObjectId::new();

        let first = store
            .insert_kick(KickDoc::new("First".into(), Category::Travel, owner))
            .await
            .unwrap();
        store
            .insert_kick(KickDoc::new("Not mine".into(), Category::Travel, other))
            .await
            .unwrap();
        let second = store
            .insert_kick(KickDoc::new("Second".into(), Category::Travel, owner))
            .await
            .unwrap();

        let listed = store.list_by_owner(&owner).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|k| k._id).collect();
        assert_eq!(ids, vec![second._id, first._id]);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title_and_keeps_document() {
        let store = MemoryKickStore::new();
        let kick = store
            .insert_kick(KickDoc::new("Skydive".into(), Category::Adventure, ObjectId::new()))
            .await
            .unwrap();
        let id = kick._id.unwrap();

        let changes = KickChanges {
            title: Some(String::new()),
            status: Some(KickStatus::Completed),
            ..Default::default()
        };
        assert!(store.update_kick(&id, &changes).await.is_err());

        let stored = store.find_kick(&id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Skydive");
        assert_eq!(stored.status, KickStatus::Open);
    }

    #[tokio::test]
    async fn test_concurrent_comment_appends_are_not_lost() {
        let store = Arc::new(MemoryKickStore::new());
        let kick = store
            .insert_kick(KickDoc::new("Climb".into(), Category::Adventure, ObjectId::new()))
            .await
            .unwrap();
        let id = kick._id.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .push_comment(&id, CommentDoc::new(format!("comment {i}"), ObjectId::new()))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(true));
        }

        let stored = store.find_kick(&id).await.unwrap().unwrap();
        assert_eq!(stored.comments.len(), 16);
    }

    #[tokio::test]
    async fn test_pull_comment_reports_missing() {
        let store = MemoryKickStore::new();
        let kick = store
            .insert_kick(KickDoc::new("Paint".into(), Category::Creative, ObjectId::new()))
            .await
            .unwrap();
        let id = kick._id.unwrap();
        let comment = CommentDoc::new("Start with watercolor".into(), ObjectId::new());
        let comment_id = comment._id;

        store.push_comment(&id, comment).await.unwrap();
        assert!(store.pull_comment(&id, &comment_id).await.unwrap());
        assert!(!store.pull_comment(&id, &comment_id).await.unwrap());
        assert!(!store.pull_comment(&ObjectId::new(), &comment_id).await.unwrap());
    }
}
