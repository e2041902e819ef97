//! Shared types for Kicklist

pub mod error;

pub use error::{
    AuthError, AuthzError, ConflictError, KicklistError, NotFoundError, Result, ValidationError,
};
