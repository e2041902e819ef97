//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant with fixed cost parameters. Verification reads
//! the parameters back from the stored PHC string, so older hashes keep
//! working if the costs change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::types::KicklistError;

/// Memory cost in KiB
const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Iterations
const TIME_COST: u32 = 2;
/// Lanes
const PARALLELISM: u32 = 1;

fn hasher() -> Result<Argon2<'static>, KicklistError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| KicklistError::Internal(format!("Invalid argon2 parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id
///
/// Returns the PHC-formatted hash string that includes the salt and parameters.
pub fn hash_password(password: &str) -> Result<String, KicklistError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| KicklistError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, KicklistError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| KicklistError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
