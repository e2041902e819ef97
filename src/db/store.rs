//! Store traits for accounts and kicks
//!
//! The service layer only talks to these traits, so the backing engine can be
//! swapped (MongoDB in production, in-memory for dev mode and tests). Store
//! failures come back as typed `StoreError` values rather than the driver's
//! native error type.

use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::db::schemas::{AccountDoc, CommentDoc, KickChanges, KickDoc};

/// Failure reported by a store implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique index rejected the write
    #[error("duplicate key on index {index}")]
    Duplicate { index: String },

    /// A document-level constraint rejected the write
    #[error("document validation failed on {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Anything else from the backing engine
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Account directory
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Handle and email uniqueness is enforced here,
    /// whatever pre-checks the caller ran.
    async fn create_account(&self, account: AccountDoc) -> StoreResult<AccountDoc>;

    async fn find_by_handle(&self, handle: &str) -> StoreResult<Option<AccountDoc>>;

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<AccountDoc>>;

    /// Batch lookup used to resolve owner/author references
    async fn find_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<AccountDoc>>;

    /// Short name of the backing engine, reported by the health endpoint
    fn kind(&self) -> &'static str;
}

/// Kick store with embedded comments
#[async_trait]
pub trait KickStore: Send + Sync {
    /// Insert a kick and return it with its assigned id
    async fn insert_kick(&self, kick: KickDoc) -> StoreResult<KickDoc>;

    async fn find_kick(&self, id: &ObjectId) -> StoreResult<Option<KickDoc>>;

    /// All kicks owned by `owner`, newest first
    async fn list_by_owner(&self, owner: &ObjectId) -> StoreResult<Vec<KickDoc>>;

    /// Apply a partial update. Returns the updated kick, or `None` if it no
    /// longer exists.
    async fn update_kick(&self, id: &ObjectId, changes: &KickChanges)
        -> StoreResult<Option<KickDoc>>;

    /// Remove a kick together with its comments. Returns whether it existed.
    async fn delete_kick(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Atomically append a comment. Only the comment list is written.
    /// Returns false if the kick does not exist.
    async fn push_comment(&self, kick_id: &ObjectId, comment: CommentDoc) -> StoreResult<bool>;

    /// Replace a comment's text in place. Returns the updated comment, or
    /// `None` if the kick or comment is gone.
    async fn set_comment_text(
        &self,
        kick_id: &ObjectId,
        comment_id: &ObjectId,
        text: &str,
    ) -> StoreResult<Option<CommentDoc>>;

    /// Remove a single comment. Returns whether it was removed.
    async fn pull_comment(&self, kick_id: &ObjectId, comment_id: &ObjectId) -> StoreResult<bool>;
}
