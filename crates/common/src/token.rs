//! API token generation.

use rand::RngCore;

/// Number of random bytes in a token key.
const TOKEN_BYTES: usize = 20;

/// Generates the 40-character hex keys used in `Authorization: Token <key>`.
#[derive(Debug, Clone, Default)]
pub struct TokenGenerator {
    _private: (),
}

impl TokenGenerator {
    /// Create a new token generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a cryptographically secure random token key.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Returns whether `key` has the shape of a generated token.
#[must_use]
pub fn is_well_formed(key: &str) -> bool {
    key.len() == TOKEN_BYTES * 2 && key.bytes().all(|b| b.is_ascii_hexdigit())
}
