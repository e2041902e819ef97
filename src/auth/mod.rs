//! Authentication for Kicklist
//!
//! Provides:
//! - JWT session tokens
//! - Password hashing with Argon2
//! - The bearer-token gate in front of kick routes

pub mod gate;
pub mod jwt;
pub mod password;

pub use gate::{authenticate, extract_bearer, Caller};
pub use jwt::{Claims, JwtValidator};
pub use password::{hash_password, verify_password};
