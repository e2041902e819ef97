//! Request authentication gate
//!
//! Every kick and comment route runs through [`authenticate`] before any
//! path or body validation.

use bson::oid::ObjectId;

use crate::auth::JwtValidator;
use crate::types::AuthError;

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: ObjectId,
    pub handle: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Resolve the caller's identity from the raw header value
pub fn authenticate(header: Option<&str>, jwt: &JwtValidator) -> Result<Caller, AuthError> {
    let token = extract_bearer(header)?;
    let claims = jwt.verify(token)?;
    let id = ObjectId::parse_str(&claims.account_id).map_err(|_| AuthError::Malformed)?;

    Ok(Caller {
        id,
        handle: claims.handle,
    })
}
