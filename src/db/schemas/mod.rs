//! Database schemas for Kicklist
//!
//! Defines MongoDB document structures for accounts and kicks.

mod account;
mod kick;
mod metadata;

pub use account::{AccountDoc, ACCOUNT_COLLECTION, EMAIL_INDEX, HANDLE_INDEX};
pub use kick::{
    validate_comment_text, Category, CommentDoc, KickChanges, KickDoc, KickStatus,
    KICK_COLLECTION,
};
pub use metadata::Metadata;
