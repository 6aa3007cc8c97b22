// src/common/id_generator.rs
//! Identifier and opaque token generation
//!
//! Users and accounts get human-readable, prefixed Crockford Base32 IDs
//! (`U_K7NP3X2QMA`). Sessions and verification records use UUIDs, and the
//! secret value mailed to users is 32 random bytes, base64url encoded.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{Rng, RngCore};
use uuid::Uuid;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Random characters after the prefix
const ID_LENGTH: usize = 10;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User (U_)
    User,
    /// Account (A_)
    Account,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Account => "A",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

/// Generate a User ID (U_XXXXXXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate an Account ID (A_XXXXXXXXXX)
pub fn generate_account_id() -> String {
    generate_id(EntityPrefix::Account)
}

/// Generate a Session ID
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a Verification record ID
pub fn generate_verification_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate the single-use secret sent by email (256 bits)
pub fn generate_opaque_token() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let user_id = generate_user_id();
        assert!(user_id.starts_with("U_"));
        assert_eq!(user_id.len(), 2 + ID_LENGTH);

        let account_id = generate_account_id();
        assert!(account_id.starts_with("A_"));
        assert_eq!(account_id.len(), 2 + ID_LENGTH);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_user_id();
        let random_part = &id[2..];

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(generate_user_id()), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_opaque_token() {
        let token = generate_opaque_token();
        // 32 bytes, base64url without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_opaque_token());
    }

    #[test]
    fn test_session_ids_are_uuids() {
        let id = generate_session_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert!(Uuid::parse_str(&generate_verification_id()).is_ok());
    }
}
