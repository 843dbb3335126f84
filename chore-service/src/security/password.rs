/// Password and PIN hashing using Argon2id
use crate::error::{ChoreError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password or PIN.
///
/// A random 16-byte salt is generated per call, so hashing the same
/// secret twice yields different digests. Returns a PHC-formatted string
/// safe for database storage.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let digest = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| ChoreError::Hashing(format!("hashing failed: {}", e)))?
        .to_string();

    Ok(digest)
}

/// Verify a candidate secret against its stored digest.
///
/// Returns `false` on mismatch; only a digest that cannot be parsed or an
/// internal verifier failure is an error.
pub fn verify_secret(candidate: &str, digest: &str) -> Result<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| ChoreError::Hashing(format!("invalid digest format: {}", e)))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ChoreError::Hashing(format!("verification failed: {}", e))),
    }
}
