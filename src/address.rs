//! TRON account addresses.
//!
//! An address is 21 bytes: the `0x41` network prefix followed by the last
//! 20 bytes of the Keccak-256 hash of the uncompressed public key. Users see
//! it as Base58Check (always starts with `T`); the node API also accepts the
//! 42-character hex form.

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use thiserror::Error;

pub const ADDRESS_PREFIX: u8 = 0x41;
pub const ADDRESS_LEN: usize = 21;
const BASE58_LEN: usize = 34;
const CHECKSUM_LEN: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 encoding")]
    Base58,
    #[error("invalid hex encoding")]
    Hex,
    #[error("invalid address length: {0} (expected {ADDRESS_LEN} bytes)")]
    Length(usize),
    #[error("invalid address prefix 0x{0:02x} (expected 0x41)")]
    Prefix(u8),
    #[error("address checksum mismatch")]
    Checksum,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Derive the address controlled by `key`.
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the 0x04 SEC1 tag; the hash covers x || y only.
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(&hash[12..]);
        Address(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != ADDRESS_LEN {
            return Err(AddressError::Length(bytes.len()));
        }
        if bytes[0] != ADDRESS_PREFIX {
            return Err(AddressError::Prefix(bytes[0]));
        }
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(bytes);
        Ok(Address(out))
    }

    /// Parse the 42-character hex form, with or without a `0x` marker.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(|_| AddressError::Hex)?;
        Self::from_bytes(&raw)
    }

    /// Parse the Base58Check form.
    pub fn from_base58(s: &str) -> Result<Self, AddressError> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::Base58)?;
        if decoded.len() != ADDRESS_LEN + CHECKSUM_LEN {
            return Err(AddressError::Length(decoded.len().saturating_sub(CHECKSUM_LEN)));
        }

        let (body, checksum) = decoded.split_at(ADDRESS_LEN);
        if checksum != &double_sha256(body)[..CHECKSUM_LEN] {
            return Err(AddressError::Checksum);
        }
        Self::from_bytes(body)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// The 20-byte account hash without the network prefix, as used in ABI words.
    pub fn account_hash(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_base58(&self) -> String {
        let mut full = self.0.to_vec();
        full.extend_from_slice(&double_sha256(&self.0)[..CHECKSUM_LEN]);
        bs58::encode(full).into_string()
    }
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts Base58Check (`T...`) or hex (`41...` / `0x41...`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == BASE58_LEN && s.starts_with('T') {
            Self::from_base58(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    const USDT_MAINNET: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    fn key_one() -> SigningKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        SigningKey::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let key = key_one();
        let a = Address::from_public_key(key.verifying_key());
        let b = Address::from_public_key(key.verifying_key());
        assert_eq!(a, b);
        assert_eq!(a.as_bytes()[0], ADDRESS_PREFIX);
        assert!(a.to_base58().starts_with('T'));
    }

    #[test]
    fn test_known_key_derives_known_address() {
        // Private key 1 maps to Ethereum address 0x7e5f4552091a69125d5dfcb7b8c2659029395bdf.
        let addr = Address::from_public_key(key_one().verifying_key());
        assert_eq!(addr.to_hex(), "417e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_base58_and_hex_agree() {
        let addr: Address = USDT_MAINNET.parse().unwrap();
        assert_eq!(addr.to_base58(), USDT_MAINNET);

        let via_hex = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(via_hex, addr);

        let with_marker = Address::from_hex(&format!("0x{}", addr.to_hex())).unwrap();
        assert_eq!(with_marker, addr);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(Address::from_base58("Invalid!@#"), Err(AddressError::Base58));
        assert!(matches!(Address::from_hex("41"), Err(AddressError::Length(1))));
        assert_eq!(Address::from_hex("zz"), Err(AddressError::Hex));

        let wrong_prefix = format!("42{}", "0".repeat(40));
        assert_eq!(Address::from_hex(&wrong_prefix), Err(AddressError::Prefix(0x42)));

        // Flip the last character to break the checksum.
        let mut broken = USDT_MAINNET.to_string();
        broken.pop();
        broken.push('u');
        assert!(Address::from_base58(&broken).is_err());
    }

    #[test]
    fn test_serde_uses_base58() {
        let addr: Address = USDT_MAINNET.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", USDT_MAINNET));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
