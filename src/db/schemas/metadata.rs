//! Common metadata for all documents
//!
//! Tracks creation and modification timestamps. Deletion is a hard removal,
//! so there is no tombstone state here.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamp
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            updated_at: Some(now),
            created_at: Some(now),
        }
    }

    /// Stamp both timestamps with the current time
    pub fn stamp_created(&mut self) {
        let now = DateTime::now();
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    /// Bump the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Some(DateTime::now());
    }
}
