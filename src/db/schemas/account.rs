//! Account document schema
//!
//! Stores sign-in credentials and the public profile of an account.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for accounts
pub const ACCOUNT_COLLECTION: &str = "accounts";

/// Index names, also used to tell which unique key a duplicate-key error hit
pub const HANDLE_INDEX: &str = "handle_unique";
pub const EMAIL_INDEX: &str = "email_unique";

/// Account document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Unique sign-in handle
    pub handle: String,

    /// Display name
    pub name: String,

    /// Unique email address
    pub email: String,

    /// Argon2 password hash (PHC string). Never leaves the server.
    pub password_hash: String,
}

impl AccountDoc {
    /// Create a new account document
    pub fn new(handle: String, name: String, email: String, password_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            handle,
            name,
            email,
            password_hash,
        }
    }
}

impl IntoIndexes for AccountDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "handle": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name(HANDLE_INDEX.to_string())
                        .build(),
                ),
            ),
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name(EMAIL_INDEX.to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AccountDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
