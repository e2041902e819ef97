//! Outward-facing representations
//!
//! Documents never leave the service layer directly. Everything a client sees
//! is built here, which keeps password hashes and raw BSON out of responses.

use bson::{oid::ObjectId, DateTime};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::db::schemas::{AccountDoc, CommentDoc, KickDoc};

/// Account handles keyed by id, used to populate references
pub type HandleIndex = HashMap<ObjectId, String>;

fn timestamp(value: Option<DateTime>) -> Option<String> {
    value.map(|dt| dt.to_chrono().to_rfc3339())
}

fn date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

fn id_hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

/// Public account view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&AccountDoc> for AccountView {
    fn from(doc: &AccountDoc) -> Self {
        Self {
            id: id_hex(doc._id),
            handle: doc.handle.clone(),
            name: doc.name.clone(),
            email: doc.email.clone(),
            created_at: timestamp(doc.metadata.created_at),
        }
    }
}

/// Reference to another account. `handle` is present when populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl AccountRef {
    pub fn resolve(id: &ObjectId, handles: &HandleIndex) -> Self {
        Self {
            id: id.to_hex(),
            handle: handles.get(id).cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub author: AccountRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CommentView {
    pub fn build(doc: &CommentDoc, handles: &HandleIndex) -> Self {
        Self {
            id: doc._id.to_hex(),
            text: doc.text.clone(),
            author: AccountRef::resolve(&doc.author, handles),
            created_at: timestamp(doc.metadata.created_at),
            updated_at: timestamp(doc.metadata.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KickView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    pub owner: AccountRef,
    pub comments: Vec<CommentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl KickView {
    /// Build a view. Owner and comment-author handles are taken from
    /// `handles`; ids missing from it are rendered unpopulated.
    pub fn build(doc: &KickDoc, handles: &HandleIndex) -> Self {
        Self {
            id: id_hex(doc._id),
            title: doc.title.clone(),
            description: doc.description.clone(),
            category: doc.category.as_str(),
            status: doc.status.as_str(),
            location: doc.location.clone(),
            target_date: date(doc.target_date),
            completion_date: date(doc.completion_date),
            owner: AccountRef::resolve(&doc.owner, handles),
            comments: doc
                .comments
                .iter()
                .map(|c| CommentView::build(c, handles))
                .collect(),
            created_at: timestamp(doc.metadata.created_at),
            updated_at: timestamp(doc.metadata.updated_at),
        }
    }
}

/// Token plus account, returned by sign-up and sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub account: AccountView,
}

/// Confirmation body for deletions
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub message: String,
}

impl MessageView {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Category;

    #[test]
    fn test_account_view_has_no_password_hash() {
        let mut doc = AccountDoc::new(
            "ada".into(),
            "Ada".into(),
            "ada@example.com".into(),
            "$argon2id$v=19$secret".into(),
        );
        doc._id = Some(ObjectId::new());

        let json = serde_json::to_value(AccountView::from(&doc)).unwrap();
        assert_eq!(json["handle"], "ada");
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_kick_view_populates_known_handles_only() {
        let owner = ObjectId::new();
        let stranger = ObjectId::new();
        let mut doc = KickDoc::new("Surf".into(), Category::Fitness, owner);
        doc._id = Some(ObjectId::new());
        doc.target_date = NaiveDate::from_ymd_opt(2027, 6, 1);
        doc.comments.push(CommentDoc::new("Cold water".into(), stranger));

        let mut handles = HandleIndex::new();
        handles.insert(owner, "ada".into());

        let json = serde_json::to_value(KickView::build(&doc, &handles)).unwrap();
        assert_eq!(json["owner"]["handle"], "ada");
        assert_eq!(json["targetDate"], "2027-06-01");
        assert_eq!(json["status"], "Open");
        assert_eq!(json["comments"][0]["author"]["id"], stranger.to_hex());
        assert!(json["comments"][0]["author"].get("handle").is_none());
    }
}
