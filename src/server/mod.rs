//! HTTP server for Kicklist

pub mod http;

pub use http::{dispatch, run, AppState};
