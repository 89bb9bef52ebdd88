//! API key generation and SHA-256 hashing (RustCrypto `sha2`).

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Prefix of every issued key, to make them recognisable in logs and configs.
pub const API_KEY_PREFIX: &str = "exf_";

/// Generate a fresh plaintext API key (prefix + 64 random hex chars).
pub fn generate_api_key() -> String {
    format!(
        "{API_KEY_PREFIX}{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Lowercase hex SHA-256 digest of an API key.
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_value() {
        // SHA-256 of empty string
        assert_eq!(
            hash_api_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let hash = hash_api_key("exf_test");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with(API_KEY_PREFIX));
        assert_eq!(a.len(), API_KEY_PREFIX.len() + 64);
        assert_ne!(a, b);
        assert_ne!(hash_api_key(&a), hash_api_key(&b));
    }
}
