use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("secret must not be empty")]
    EmptySecret,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// One-way hash of a plaintext secret, argon2id with a fresh per-record salt.
pub fn hash_password(plain: &str) -> Result<String, CredentialError> {
    if plain.is_empty() {
        return Err(CredentialError::EmptySecret);
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            CredentialError::Hash(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of a plaintext against a stored hash. A stored hash
/// that does not parse as a PHC string counts as a mismatch, never an error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "secret1";
        let hash = hash_password(password).expect("hashing should succeed");
        assert_ne!(hash, password);
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn verify_is_false_on_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn hash_rejects_empty_secret() {
        let err = hash_password("").unwrap_err();
        assert!(matches!(err, CredentialError::EmptySecret));
    }

    #[test]
    fn hashes_are_salted_per_record() {
        let a = hash_password("same-secret").expect("hash");
        let b = hash_password("same-secret").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("same-secret", &a));
        assert!(verify_password("same-secret", &b));
    }
}
