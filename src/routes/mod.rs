//! HTTP routes for Kicklist

pub mod auth_routes;
pub mod health;
pub mod kicks;
pub mod response;

pub use auth_routes::handle_auth_request;
pub use health::{health_check, version_info};
pub use kicks::handle_kick_request;
pub use response::{
    apply_cors, error_response, json_response, parse_json_body, preflight_response, BoxBody,
    ErrorResponse,
};
