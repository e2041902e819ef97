//! Services layer for Kicklist
//!
//! Business rules sit here, between the HTTP routes and the store traits.
//!
//! ## Services
//!
//! - **AccountService**: sign-up, sign-in and account lookup
//! - **KickService**: kick lifecycle, ownership checks and embedded comments

pub mod accounts;
pub mod kicks;
pub mod views;

pub use accounts::{AccountService, SignInRequest, SignUpRequest};
pub use kicks::{parse_id, CommentRequest, KickPolicy, KickRequest, KickService, StatusRequest};
pub use views::{AccountRef, AccountView, AuthSession, CommentView, KickView, MessageView};
