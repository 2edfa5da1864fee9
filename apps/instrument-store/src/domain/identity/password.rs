//! Salted password digests.

use sha2::{Digest, Sha256};

/// A salted SHA-256 password digest stored as `salt$hash` (both hex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash a plain-text password with a fresh random salt.
    #[must_use]
    pub fn hash(plain: &str) -> Self {
        let salt = hex::encode(uuid::Uuid::new_v4().as_bytes());
        let hash = digest(&salt, plain);
        Self(format!("{salt}${hash}"))
    }

    /// Wrap a digest loaded from storage.
    #[must_use]
    pub const fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    /// Check a plain-text password against this digest.
    #[must_use]
    pub fn verify(&self, plain: &str) -> bool {
        let Some((salt, expected)) = self.0.split_once('$') else {
            return false;
        };
        let actual = digest(salt, plain);
        actual.len() == expected.len()
            && actual
                .bytes()
                .zip(expected.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    /// Stored representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// One salted SHA-256 pass, in place of the unsalted MD5 digests the store
// used to keep. Not a key-derivation function: there is no work factor
// against offline guessing.
fn digest(salt: &str, plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}
