//! Kicklist - REST API for a personal bucket list
//!
//! Accounts sign up and sign in for a bearer token, then create "kicks"
//! (goals), track their status and leave comments on each other's kicks.
//!
//! ## Layers
//!
//! - **Routes**: hyper handlers, body parsing, error bodies
//! - **Services**: validation, ownership and authorship checks
//! - **Store**: `AccountStore` / `KickStore` over MongoDB or memory

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{dispatch, run, AppState};
pub use types::{KicklistError, Result};
