//! Registration, sign-in and account lookup

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{hash_password, verify_password, Caller, JwtValidator};
use crate::db::{AccountDoc, AccountStore};
use crate::services::views::{AccountView, AuthSession};
use crate::types::{AuthError, ConflictError, KicklistError, NotFoundError, Result, ValidationError};

/// POST /auth/signup body
#[derive(Debug, Default, Deserialize)]
pub struct SignUpRequest {
    #[serde(default, alias = "username")]
    pub handle: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /auth/signin body
#[derive(Debug, Default, Deserialize)]
pub struct SignInRequest {
    #[serde(default, alias = "username")]
    pub handle: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Trimmed value, or record the field as missing
fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(field);
            ""
        }
    }
}

/// Password is taken verbatim, only emptiness counts as missing
fn required_password<'a>(value: &'a Option<String>, missing: &mut Vec<&'static str>) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push("password");
            ""
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    jwt: JwtValidator,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, jwt: JwtValidator) -> Self {
        Self { store, jwt }
    }

    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }

    pub fn jwt(&self) -> &JwtValidator {
        &self.jwt
    }

    /// Create an account and sign it in
    pub async fn register(&self, req: SignUpRequest) -> Result<AuthSession> {
        let mut missing = Vec::new();
        let handle = required(&req.handle, "handle", &mut missing);
        let password = required_password(&req.password, &mut missing);
        let name = required(&req.name, "name", &mut missing);
        let email = required(&req.email, "email", &mut missing);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing).into());
        }

        if self.store.find_by_handle(handle).await?.is_some() {
            debug!("Sign-up rejected, handle taken: {}", handle);
            return Err(ConflictError::HandleTaken.into());
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let account = self
            .store
            .create_account(AccountDoc::new(
                handle.to_string(),
                name.to_string(),
                email.to_string(),
                password_hash,
            ))
            .await?;

        info!("Account created: {}", account.handle);
        self.session_for(&account)
    }

    /// Exchange handle and password for a token
    ///
    /// Unknown handle and wrong password produce the same error.
    pub async fn sign_in(&self, req: SignInRequest) -> Result<AuthSession> {
        let mut missing = Vec::new();
        let handle = required(&req.handle, "handle", &mut missing);
        let password = required_password(&req.password, &mut missing);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing).into());
        }

        let Some(account) = self.store.find_by_handle(handle).await? else {
            warn!("Sign-in failed - unknown handle: {}", handle);
            return Err(AuthError::InvalidCredentials.into());
        };

        let valid = verify_blocking(password.to_string(), account.password_hash.clone()).await?;
        if !valid {
            warn!("Sign-in failed - invalid password: {}", handle);
            return Err(AuthError::InvalidCredentials.into());
        }

        info!("Sign-in successful: {}", handle);
        self.session_for(&account)
    }

    /// Public view of the calling account
    pub async fn me(&self, caller: &Caller) -> Result<AccountView> {
        self.store
            .find_by_id(&caller.id)
            .await?
            .map(|doc| AccountView::from(&doc))
            .ok_or_else(|| NotFoundError::Account.into())
    }

    fn session_for(&self, account: &AccountDoc) -> Result<AuthSession> {
        let view = AccountView::from(account);
        let token = self.jwt.issue(&view.id, &account.handle)?;
        Ok(AuthSession {
            token,
            account: view,
        })
    }
}

// Argon2 at these costs is tens of milliseconds of CPU; keep it off the
// async workers.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| KicklistError::Internal(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| KicklistError::Internal(format!("Verification task failed: {}", e)))?
}
