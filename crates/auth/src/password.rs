//! Password hashing (argon2, PHC string format) and strength rules.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use storefront_core::{DomainError, DomainResult};

use crate::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Returns `false` for a mismatch and for an unparseable stored hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn validate_password_strength(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::field(
            "password",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::field(
            "password",
            "This password is entirely numeric.",
        ));
    }
    Ok(())
}
