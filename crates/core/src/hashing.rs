//! Digests of bearer secrets (invite tokens, refresh tokens).
//!
//! Secrets are handed to the client once; only the digest is stored and
//! lookups hash the presented value first.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a secret.
pub fn secret_digest(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            secret_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn differs_per_secret() {
        assert_ne!(secret_digest("token-a"), secret_digest("token-b"));
        assert_eq!(secret_digest("token-a").len(), 64);
    }
}
