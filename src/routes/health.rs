//! Health and version endpoints
//!
//! - /health - liveness probe, also reports which store backs the service
//! - /version - build information captured by build.rs

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// Always true while the process is serving
    pub healthy: bool,
    /// Service version
    pub version: &'static str,
    /// Backing store ("mongodb" or "memory")
    pub store: &'static str,
    /// Operating mode
    pub mode: &'static str,
    /// Current timestamp
    pub timestamp: String,
}

/// Handle liveness probe (/health)
pub fn health_check(state: &AppState) -> Response<BoxBody> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        store: state.accounts.store_kind(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    json_response(StatusCode::OK, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<BoxBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: env!("CARGO_PKG_NAME"),
    };

    json_response(StatusCode::OK, &response)
}
