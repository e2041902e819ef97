//! Configuration for Kicklist
//!
//! CLI arguments and environment variable handling using clap. Parsed once in
//! `main` and handed to constructors; nothing reads the environment after
//! startup.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;

use crate::auth::JwtValidator;
use crate::types::KicklistError;

/// Who may read a single kick by id
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadScope {
    /// Any authenticated account may read any kick
    #[default]
    AnyAuthenticated,
    /// Only the owner may read; everyone else gets a not-found
    OwnerOnly,
}

/// Kicklist - REST API for a personal bucket list
#[derive(Parser, Debug, Clone)]
#[command(name = "kicklist")]
#[command(about = "REST API for tracking bucket-list kicks and their comments")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "kicklist")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required outside dev mode)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token lifetime in seconds; 0 issues non-expiring tokens
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Comma-separated list of allowed CORS origins ("*" allows any)
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "*")]
    pub allowed_origins: String,

    /// Reject kicks created without a description
    #[arg(long, env = "REQUIRE_DESCRIPTION", default_value = "false")]
    pub require_description: bool,

    /// Visibility of GET /kicks/:id
    #[arg(long, env = "KICK_READ_SCOPE", value_enum, default_value = "any-authenticated")]
    pub kick_read_scope: ReadScope,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "65536")]
    pub max_body_bytes: usize,

    /// Enable development mode (dev signing secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// Baseline for tests and embedding. Unlike the CLI, dev mode is on so a
/// validator can be built without a secret.
impl Default for Args {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "kicklist".into(),
            jwt_secret: None,
            jwt_expiry_seconds: 86400,
            allowed_origins: "*".into(),
            require_description: false,
            kick_read_scope: ReadScope::default(),
            max_body_bytes: 64 * 1024,
            dev_mode: true,
            log_level: "info".into(),
            log_json: false,
        }
    }
}

impl Args {
    /// Parsed CORS origin list
    pub fn allowed_origin_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Build the token issuer. Dev mode without a secret uses the built-in one.
    pub fn jwt_validator(&self) -> Result<JwtValidator, KicklistError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtValidator::new(secret.clone(), self.jwt_expiry_seconds),
            (None, true) => Ok(JwtValidator::new_dev(self.jwt_expiry_seconds)),
            (None, false) => Err(KicklistError::Config(
                "JWT_SECRET is required outside dev mode".into(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required outside dev mode".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        self.jwt_validator().map(|_| ()).map_err(|e| e.to_string())
    }
}
