//! Unsigned and signed transaction payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::crypto::{self, RecoverableSignature};

/// Transaction identifier: the content hash, shown as bare lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId([u8; 32]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}

impl From<[u8; 32]> for TxId {
    fn from(bytes: [u8; 32]) -> Self {
        TxId(bytes)
    }
}

/// A node-built transaction that has not been signed yet.
///
/// Only the raw protobuf bytes are authoritative. The node also reports a
/// `txID` and a JSON rendering of the payload; the id is kept for diagnostics
/// only and the JSON is echoed back on broadcast.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    raw: Vec<u8>,
    raw_json: serde_json::Value,
    reported_txid: Option<String>,
}

impl UnsignedTransaction {
    pub fn new(raw: Vec<u8>) -> Self {
        Self {
            raw,
            raw_json: serde_json::Value::Null,
            reported_txid: None,
        }
    }

    pub fn from_node(
        raw: Vec<u8>,
        raw_json: serde_json::Value,
        reported_txid: Option<String>,
    ) -> Self {
        Self {
            raw,
            raw_json,
            reported_txid,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn raw_json(&self) -> &serde_json::Value {
        &self.raw_json
    }

    pub fn reported_txid(&self) -> Option<&str> {
        self.reported_txid.as_deref()
    }

    /// Always recomputed from the raw bytes.
    pub fn content_hash(&self) -> [u8; 32] {
        crypto::content_hash(&self.raw)
    }

    pub fn txid(&self) -> TxId {
        TxId(self.content_hash())
    }

    /// Attach the first signature. Consumes the payload, so it cannot be signed twice.
    pub fn into_signed(self, signature: RecoverableSignature) -> SignedTransaction {
        SignedTransaction {
            txid: self.txid(),
            unsigned: self,
            signatures: vec![signature],
        }
    }
}

/// An [`UnsignedTransaction`] with at least one signature over its content hash.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    txid: TxId,
    unsigned: UnsignedTransaction,
    signatures: Vec<RecoverableSignature>,
}

impl SignedTransaction {
    pub fn txid(&self) -> TxId {
        self.txid
    }

    pub fn raw(&self) -> &[u8] {
        self.unsigned.raw()
    }

    pub fn raw_json(&self) -> &serde_json::Value {
        self.unsigned.raw_json()
    }

    /// Never empty.
    pub fn signatures(&self) -> &[RecoverableSignature] {
        &self.signatures
    }

    pub fn add_signature(&mut self, signature: RecoverableSignature) {
        self.signatures.push(signature);
    }

    /// True if some signature recovers to `address`.
    pub fn verify(&self, address: &Address) -> bool {
        let digest = self.txid.0;
        self.signatures
            .iter()
            .any(|sig| sig.recover_address(&digest).as_ref() == Some(address))
    }

    /// JSON body for `/wallet/broadcasttransaction`.
    pub fn to_broadcast_body(&self) -> BroadcastBody {
        BroadcastBody {
            txid: self.txid.to_hex(),
            raw_data: self.unsigned.raw_json.clone(),
            raw_data_hex: hex::encode(&self.unsigned.raw),
            signature: self.signatures.iter().map(|s| s.to_hex()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastBody {
    #[serde(rename = "txID")]
    pub txid: String,
    pub raw_data: serde_json::Value,
    pub raw_data_hex: String,
    pub signature: Vec<String>,
}
