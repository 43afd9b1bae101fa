use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::Error;

/// Hashes a signup password with argon2id and a fresh random salt. The
/// parameters ride along inside the returned PHC string, so they can be
/// tightened later without invalidating existing accounts.
pub fn new_hash(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHasherError(e.to_string()))
}

/// Checks a login attempt against the stored hash. A non-matching password
/// is [`Error::InvalidPassword`]; anything else means the stored hash is
/// unparseable.
pub fn verify_password(password: &str, hash_str: &str) -> Result<(), Error> {
    let hash =
        PasswordHash::new(hash_str).map_err(|e| Error::PasswordHasherError(e.to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .map_err(|_| Error::InvalidPassword)
}
