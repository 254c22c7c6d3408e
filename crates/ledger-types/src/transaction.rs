use serde::{Deserialize, Serialize};

use crate::hash::Hashable;
use crate::signing::SigningOracle;

/// An identified, signed payload.
///
/// Transactions created through [`Transaction::signed`] carry a public key
/// and signature produced by the node's oracle and verify at creation
/// time. The `from_parts` constructors wrap caller-supplied fields, used
/// for wire deserialization and by adversarial peers; nothing guarantees
/// those verify. Ids are assigned by the chain or the buffer, never by the
/// creator, and increment across the whole chain regardless of which block
/// a transaction lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: u32,
    public_key: Option<String>,
    signature: Option<String>,
    payload: String,
}

impl Transaction {
    /// Creates a new transaction signed with the oracle's key pair.
    ///
    /// The id is 0 until [`Transaction::set_id`] assigns the real one,
    /// which does not necessarily reflect the id it should carry in a
    /// given chain.
    pub fn signed(payload: impl Into<String>, oracle: &dyn SigningOracle) -> Self {
        let payload = payload.into();
        let signature = oracle.sign(&payload);
        Self {
            id: 0,
            public_key: Some(oracle.public_key_hex()),
            signature: Some(signature),
            payload,
        }
    }

    /// Wraps caller-supplied fields with id 0. There is no guarantee the
    /// result verifies.
    pub fn from_parts(
        payload: impl Into<String>,
        public_key: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self::from_parts_with_id(payload, public_key, signature, 0)
    }

    /// Wraps caller-supplied fields. There is no guarantee the result
    /// verifies, nor that the id fits any particular chain.
    pub fn from_parts_with_id(
        payload: impl Into<String>,
        public_key: impl Into<String>,
        signature: impl Into<String>,
        id: u32,
    ) -> Self {
        Self {
            id,
            public_key: Some(public_key.into()),
            signature: Some(signature.into()),
            payload: payload.into(),
        }
    }

    /// True iff this transaction's public key signed its payload to create
    /// its signature.
    pub fn is_verified(&self, oracle: &dyn SigningOracle) -> bool {
        match (&self.public_key, &self.signature) {
            (Some(public_key), Some(signature)) => {
                oracle.verify(&self.payload, public_key, signature)
            }
            _ => false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Valid only before the transaction is sealed into a mined block.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Valid only before the transaction is sealed into a mined block.
    pub fn set_payload(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
    }

    /// Hex representation of the signer's public key.
    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }

    /// Hex representation of the signature over the payload.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

impl Hashable for Transaction {
    /// Canonical bytes: id (4-byte big-endian), payload, signature bytes
    /// when present, public key bytes when present, in that order.
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.id.to_be_bytes());
        bytes.extend_from_slice(self.payload.as_bytes());
        if let Some(signature) = &self.signature {
            bytes.extend_from_slice(signature.as_bytes());
        }
        if let Some(public_key) = &self.public_key {
            bytes.extend_from_slice(public_key.as_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::Ed25519Oracle;

    #[test]
    fn signed_transaction_verifies_at_creation() {
        let oracle = Ed25519Oracle::new();
        let tx = Transaction::signed("Hello world", &oracle);

        assert!(tx.is_verified(&oracle));
        assert!(tx.public_key().is_some());
        assert!(tx.signature().is_some());
        assert_eq!(tx.id(), 0);
    }

    #[test]
    fn wrapped_transaction_does_not_verify() {
        let oracle = Ed25519Oracle::new();
        let tx = Transaction::from_parts("Hello", "World", "");
        assert!(!tx.is_verified(&oracle));
    }

    #[test]
    fn equality_covers_all_fields() {
        let mut a = Transaction::from_parts("Hello", "World", "");
        a.set_id(1);
        let b = Transaction::from_parts_with_id("Hello", "World", "", 1);
        assert_eq!(a, b);

        let c = Transaction::from_parts_with_id("Hello", "World", "", 2);
        assert_ne!(a, c);
    }

    #[test]
    fn set_id_and_payload() {
        let mut tx = Transaction::from_parts("Hello", "World", "");
        tx.set_id(4);
        tx.set_payload("Something else");
        assert_eq!(tx.id(), 4);
        assert_eq!(tx.payload(), "Something else");
    }

    #[test]
    fn canonical_bytes_order_and_id_endianness() {
        let tx = Transaction::from_parts_with_id("Hello", "World", "", 1);
        let mut expected = vec![0, 0, 0, 1];
        expected.extend_from_slice(b"Hello");
        expected.extend_from_slice(b"World");
        assert_eq!(tx.to_bytes(), expected);
    }

    #[test]
    fn wire_shape_uses_camel_case_fields() {
        let tx = Transaction::from_parts_with_id("Hello", "World", "sig", 3);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "publicKey": "World",
                "signature": "sig",
                "payload": "Hello",
            })
        );

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn absent_key_and_signature_round_trip_as_null() {
        let json = serde_json::json!({
            "id": 0,
            "publicKey": null,
            "signature": null,
            "payload": "Hello",
        });
        let tx: Transaction = serde_json::from_value(json.clone()).unwrap();
        assert!(tx.public_key().is_none());
        assert!(tx.signature().is_none());
        assert_eq!(serde_json::to_value(&tx).unwrap(), json);
    }
}
