use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// The signing collaborator: one fixed asymmetric scheme, one key pair per
/// node process. Threaded through constructors explicitly so tests can
/// substitute it.
pub trait SigningOracle: Send + Sync {
    /// Lowercase hex encoding of this node's public key.
    fn public_key_hex(&self) -> String;

    /// Signs the payload with this node's private key, returning the hex
    /// signature.
    fn sign(&self, payload: &str) -> String;

    /// True iff `public_key_hex` signed `payload` producing
    /// `signature_hex`. Malformed keys or signatures verify false rather
    /// than erroring.
    fn verify(&self, payload: &str, public_key_hex: &str, signature_hex: &str) -> bool;
}

/// Ed25519 signing oracle.
pub struct Ed25519Oracle {
    signing_key: SigningKey,
}

impl Ed25519Oracle {
    pub fn new() -> Self {
        let mut csprng = OsRng;
        Self {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic key derivation from a seed string.
    pub fn from_seed(seed: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
        Self {
            signing_key: SigningKey::from_bytes(&digest),
        }
    }
}

impl Default for Ed25519Oracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningOracle for Ed25519Oracle {
    fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    fn sign(&self, payload: &str) -> String {
        hex::encode(self.signing_key.sign(payload.as_bytes()).to_bytes())
    }

    fn verify(&self, payload: &str, public_key_hex: &str, signature_hex: &str) -> bool {
        let Ok(key_bytes) = hex::decode(public_key_hex) else {
            return false;
        };
        let Ok(key_bytes) = <[u8; 32]>::try_from(key_bytes.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&signature_bytes) else {
            return false;
        };
        verifying_key
            .verify(payload.as_bytes(), &signature)
            .is_ok()
    }
}
