use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::planner::ValidationError;

pub const PASSWORD_MIN_LENGTH: usize = 6;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Minimum length, one digit, one uppercase letter.
pub fn check_password_policy(field: &str, plain: &str) -> Result<(), ValidationError> {
    if plain.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("password must be at least {PASSWORD_MIN_LENGTH} characters"),
        ));
    }
    if !plain.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(field, "password must contain a digit"));
    }
    if !plain.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::new(
            field,
            "password must contain an uppercase letter",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Secur3P@ss").expect("hashing should succeed");
        assert!(verify_password("Secur3P@ss", &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        assert!(verify_password("anything", "not-a-valid-hash").is_err());
    }

    #[test]
    fn policy() {
        assert_eq!(check_password_policy("password", "Ab1").unwrap_err().field, "password");
        assert!(check_password_policy("password", "abcdef1").is_err());
        assert!(check_password_policy("password", "Abcdefg").is_err());
        assert!(check_password_policy("password", "Abcdef1").is_ok());
    }
}
