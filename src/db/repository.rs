//! MongoDB-backed store implementations
//!
//! Comment mutations go through `$push`, positional `$set` and `$pull` so
//! concurrent writers never overwrite each other's view of the parent kick.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    validate_comment_text, AccountDoc, CommentDoc, KickChanges, KickDoc, ACCOUNT_COLLECTION,
    KICK_COLLECTION,
};
use crate::db::{AccountStore, KickStore, StoreError, StoreResult};

/// Account directory backed by the `accounts` collection
pub struct MongoAccountStore {
    accounts: MongoCollection<AccountDoc>,
}

impl MongoAccountStore {
    pub async fn new(mongo: &MongoClient) -> StoreResult<Self> {
        Ok(Self {
            accounts: mongo.collection(ACCOUNT_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn create_account(&self, mut account: AccountDoc) -> StoreResult<AccountDoc> {
        let id = self.accounts.insert_one(&mut account).await?;
        account._id = Some(id);
        Ok(account)
    }

    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<AccountDoc>> {
        self.accounts.find_one(doc! { "handle": handle }).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<AccountDoc>> {
        self.accounts.find_one(doc! { "_id": *id }).await
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<AccountDoc>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.accounts
            .find_many(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
    }

    fn kind(&self) -> &'static str {
        "mongodb"
    }
}

/// Kick store backed by the `kicks` collection
pub struct MongoKickStore {
    kicks: MongoCollection<KickDoc>,
}

impl MongoKickStore {
    pub async fn new(mongo: &MongoClient) -> StoreResult<Self> {
        Ok(Self {
            kicks: mongo.collection(KICK_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl KickStore for MongoKickStore {
    async fn insert_kick(&self, mut kick: KickDoc) -> StoreResult<KickDoc> {
        kick.validate()?;
        let id = self.kicks.insert_one(&mut kick).await?;
        kick._id = Some(id);
        Ok(kick)
    }

    async fn find_kick(&self, id: &ObjectId) -> StoreResult<Option<KickDoc>> {
        self.kicks.find_one(doc! { "_id": *id }).await
    }

    async fn list_by_owner(&self, owner: &ObjectId) -> StoreResult<Vec<KickDoc>> {
        self.kicks
            .find_many(
                doc! { "owner": *owner },
                Some(doc! { "metadata.created_at": -1, "_id": -1 }),
            )
            .await
    }

    async fn update_kick(
        &self,
        id: &ObjectId,
        changes: &KickChanges,
    ) -> StoreResult<Option<KickDoc>> {
        changes.validate()?;
        let set = changes.to_set_document()?;
        self.kicks
            .find_one_and_update(doc! { "_id": *id }, doc! { "$set": set })
            .await
    }

    async fn delete_kick(&self, id: &ObjectId) -> StoreResult<bool> {
        self.kicks.delete_one(doc! { "_id": *id }).await
    }

    async fn push_comment(&self, kick_id: &ObjectId, comment: CommentDoc) -> StoreResult<bool> {
        comment.validate()?;
        let comment = bson::to_bson(&comment)
            .map_err(|e| StoreError::Backend(format!("BSON encoding failed: {}", e)))?;

        let result = self
            .kicks
            .update_one(
                doc! { "_id": *kick_id },
                doc! { "$push": { "comments": comment } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_comment_text(
        &self,
        kick_id: &ObjectId,
        comment_id: &ObjectId,
        text: &str,
    ) -> StoreResult<Option<CommentDoc>> {
        validate_comment_text(text)?;

        let updated = self
            .kicks
            .find_one_and_update(
                doc! { "_id": *kick_id, "comments._id": *comment_id },
                doc! {
                    "$set": {
                        "comments.$.text": text,
                        "comments.$.metadata.updated_at": DateTime::now(),
                    }
                },
            )
            .await?;

        Ok(updated.and_then(|kick| kick.comment(comment_id).cloned()))
    }

    async fn pull_comment(&self, kick_id: &ObjectId, comment_id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .kicks
            .update_one(
                doc! { "_id": *kick_id, "comments._id": *comment_id },
                doc! { "$pull": { "comments": { "_id": *comment_id } } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}
