//! Argon2id password hashes in PHC string form, as stored in `users.password`.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Hash `password` with a fresh salt.
///
/// Pass [`Params::default`] for stored credentials; the parameters travel in
/// the PHC string, so verification needs no configuration.
///
/// # Errors
/// Returns an error if the parameters are rejected or hashing fails.
pub fn hash_password(password: &str, params: Params) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("password hashing failed: {err}"))
}

/// Check `password` against a stored PHC hash.
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed; a wrong password is
/// `Ok(false)`.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|err| anyhow!("invalid password hash format: {err}"))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("password verification failed: {err}")),
    }
}
