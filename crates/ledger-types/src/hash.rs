use std::fmt;

use sha2::{Digest, Sha256};

/// Number of bytes in a digest.
pub const HASH_LEN: usize = 32;

/// Anything that can produce a canonical byte encoding for hashing.
///
/// Implementations decide which fields participate and in what order; the
/// order must be stable so hashes stay reproducible byte-for-byte.
pub trait Hashable {
    fn to_bytes(&self) -> Vec<u8>;
}

/// An immutable SHA-256 digest with a lowercase-hex textual form.
///
/// Constructible by wrapping existing bytes or by parsing hex; never
/// mutated after construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hashcode([u8; HASH_LEN]);

impl Hashcode {
    /// Wraps existing bytes as a hashcode. Purely a construction method,
    /// nothing is hashed.
    pub fn wrap(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(hex_text: &str) -> Result<Self, MalformedHashError> {
        let bytes = hex::decode(hex_text)?;
        let len = bytes.len();
        let bytes: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| MalformedHashError::WrongLength(len))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for Hashcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hashcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hashcode({})", self.to_hex())
    }
}

/// Computes the SHA-256 hashcode of a hashable value.
pub fn hash(value: &impl Hashable) -> Hashcode {
    hash_bytes(&value.to_bytes())
}

/// Computes the SHA-256 hashcode of raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> Hashcode {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Hashcode(hasher.finalize().into())
}

#[derive(Debug, thiserror::Error)]
pub enum MalformedHashError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {HASH_LEN} bytes, got {0}")]
    WrongLength(usize),
}
