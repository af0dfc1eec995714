use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordScheme;

/// Value written to the user record's `password` field.
pub fn for_storage(scheme: PasswordScheme, plain: &str) -> anyhow::Result<String> {
    match scheme {
        PasswordScheme::Plaintext => Ok(plain.to_string()),
        PasswordScheme::Argon2 => hash_password(plain),
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Stored values that parse as PHC strings are verified with Argon2; anything
/// else is a legacy plaintext password and compared as-is.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => plain == stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn plaintext_records_compare_exactly() {
        assert!(verify_password("gym123", "gym123"));
        assert!(!verify_password("gym123", "Gym123"));
        assert!(!verify_password("", "gym123"));
    }

    #[test]
    fn storage_follows_scheme() {
        assert_eq!(for_storage(PasswordScheme::Plaintext, "pw").unwrap(), "pw");
        let stored = for_storage(PasswordScheme::Argon2, "pw").unwrap();
        assert_ne!(stored, "pw");
        assert!(verify_password("pw", &stored));
    }
}
