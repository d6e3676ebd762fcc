//! Password hashing

use bcrypt::{hash, verify, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Malformed hashes count as a mismatch
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = bcrypt::hash("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hashed));
        assert!(!verify_password("battery staple", &hashed));
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
