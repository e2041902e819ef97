//! Database layer for Kicklist
//!
//! Store traits with MongoDB and in-memory implementations.

pub mod memory;
pub mod mongo;
pub mod repository;
pub mod schemas;
pub mod store;

pub use memory::{MemoryAccountStore, MemoryKickStore};
pub use mongo::{MongoClient, MongoCollection};
pub use repository::{MongoAccountStore, MongoKickStore};
pub use schemas::{AccountDoc, Category, CommentDoc, KickChanges, KickDoc, KickStatus, Metadata};
pub use store::{AccountStore, KickStore, StoreError, StoreResult};
