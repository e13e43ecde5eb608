//! secp256k1 keys and TRON-style recoverable signatures.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::address::Address;

pub const SIGNATURE_LEN: usize = 65;

/// Parse a hex-encoded 32-byte private key (`0x` marker tolerated).
///
/// The decoded bytes are wiped once the key has been built.
pub fn parse_private_key_hex(private_key_hex: &str) -> Result<SigningKey, String> {
    let trimmed = private_key_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let bytes = Zeroizing::new(hex::decode(trimmed).map_err(|e| format!("not valid hex: {}", e))?);
    if bytes.len() != 32 {
        return Err(format!("expected 32 bytes, got {}", bytes.len()));
    }

    SigningKey::from_slice(&bytes).map_err(|_| "not a valid secp256k1 scalar".to_string())
}

/// Address owned by a raw hex private key.
pub fn address_from_private_key_hex(private_key_hex: &str) -> Result<Address, String> {
    let key = parse_private_key_hex(private_key_hex)?;
    Ok(Address::from_public_key(key.verifying_key()))
}

/// SHA-256 of the raw transaction bytes; this is both the signing digest and the txid.
pub fn content_hash(raw: &[u8]) -> [u8; 32] {
    Sha256::digest(raw).into()
}

/// A 65-byte `r || s || v` signature as the node expects it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; SIGNATURE_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Recover the signer's address for `digest`, if the signature is well-formed.
    pub fn recover_address(&self, digest: &[u8; 32]) -> Option<Address> {
        let signature = Signature::from_slice(&self.0[..64]).ok()?;
        // Accept both the raw recovery id and the Ethereum-style +27 form.
        let v = match self.0[64] {
            v @ 0..=1 => v,
            v @ 27..=28 => v - 27,
            _ => return None,
        };
        let recovery_id = RecoveryId::from_byte(v)?;
        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id).ok()?;
        Some(Address::from_public_key(&key))
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

/// Sign a 32-byte digest, returning the node's 65-byte form.
pub fn sign_digest(key: &SigningKey, digest: &[u8; 32]) -> Result<RecoverableSignature, String> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| format!("signing failed: {}", e))?;

    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(RecoverableSignature(out))
}
