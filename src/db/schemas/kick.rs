//! Kick document schema
//!
//! A kick is one bucket-list entry. Comments are embedded in the kick
//! document and are only addressable through their parent.

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::db::StoreError;

/// Collection name for kicks
pub const KICK_COLLECTION: &str = "kicks";

/// Kick category (closed set)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Adventure,
    Travel,
    Learning,
    Fitness,
    Career,
    Creative,
    Personal,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Adventure,
        Category::Travel,
        Category::Learning,
        Category::Fitness,
        Category::Career,
        Category::Creative,
        Category::Personal,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Adventure => "Adventure",
            Category::Travel => "Travel",
            Category::Learning => "Learning",
            Category::Fitness => "Fitness",
            Category::Career => "Career",
            Category::Creative => "Creative",
            Category::Personal => "Personal",
            Category::Other => "Other",
        }
    }

    /// Exact-match parse against the declared names
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(Category::as_str).collect()
    }
}

/// Kick status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KickStatus {
    #[default]
    Open,
    Completed,
}

impl KickStatus {
    pub const ALL: [KickStatus; 2] = [KickStatus::Open, KickStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            KickStatus::Open => "Open",
            KickStatus::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(KickStatus::as_str).collect()
    }
}

/// Comment embedded in a kick document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommentDoc {
    /// Identifier, unique within the parent kick
    pub _id: ObjectId,

    #[serde(default)]
    pub metadata: Metadata,

    pub text: String,

    /// Account that wrote the comment
    pub author: ObjectId,
}

impl CommentDoc {
    pub fn new(text: String, author: ObjectId) -> Self {
        Self {
            _id: ObjectId::new(),
            metadata: Metadata::new(),
            text,
            author,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_comment_text(&self.text)
    }
}

/// Kick document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KickDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub category: Category,

    #[serde(default)]
    pub status: KickStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,

    /// Owning account, fixed at creation
    pub owner: ObjectId,

    #[serde(default)]
    pub comments: Vec<CommentDoc>,
}

impl KickDoc {
    /// Create a new kick owned by `owner` with default status and no comments
    pub fn new(title: String, category: Category, owner: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title,
            description: None,
            category,
            status: KickStatus::default(),
            location: None,
            target_date: None,
            completion_date: None,
            owner,
            comments: Vec::new(),
        }
    }

    /// Document-level constraints checked on every write
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_title(&self.title)
    }

    pub fn comment(&self, comment_id: &ObjectId) -> Option<&CommentDoc> {
        self.comments.iter().find(|c| &c._id == comment_id)
    }
}

/// Field-level partial update for a kick. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KickChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<KickStatus>,
    pub location: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
}

impl KickChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Constraints re-checked at write time, same as for a full document
    pub fn validate(&self) -> Result<(), StoreError> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Apply the supplied fields to an in-memory document
    pub fn apply_to(&self, kick: &mut KickDoc) {
        if let Some(title) = &self.title {
            kick.title = title.clone();
        }
        if let Some(description) = &self.description {
            kick.description = Some(description.clone());
        }
        if let Some(category) = self.category {
            kick.category = category;
        }
        if let Some(status) = self.status {
            kick.status = status;
        }
        if let Some(location) = &self.location {
            kick.location = Some(location.clone());
        }
        if let Some(date) = self.target_date {
            kick.target_date = Some(date);
        }
        if let Some(date) = self.completion_date {
            kick.completion_date = Some(date);
        }
    }

    /// Build the `$set` body touching only the supplied fields
    pub fn to_set_document(&self) -> Result<Document, StoreError> {
        let mut set = Document::new();
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
        }
        if let Some(description) = &self.description {
            set.insert("description", description.as_str());
        }
        if let Some(category) = self.category {
            set.insert("category", category.as_str());
        }
        if let Some(status) = self.status {
            set.insert("status", status.as_str());
        }
        if let Some(location) = &self.location {
            set.insert("location", location.as_str());
        }
        if let Some(date) = self.target_date {
            set.insert("target_date", to_bson_value(&date)?);
        }
        if let Some(date) = self.completion_date {
            set.insert("completion_date", to_bson_value(&date)?);
        }
        set.insert("metadata.updated_at", bson::DateTime::now());
        Ok(set)
    }
}

fn to_bson_value<T: Serialize>(value: &T) -> Result<bson::Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Backend(format!("BSON encoding failed: {}", e)))
}

fn validate_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation {
            field: "title",
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

/// Comment text must be non-empty after trimming
pub fn validate_comment_text(text: &str) -> Result<(), StoreError> {
    if text.trim().is_empty() {
        return Err(StoreError::Validation {
            field: "text",
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

impl IntoIndexes for KickDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "owner": 1, "metadata.created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("owner_created_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for KickDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
