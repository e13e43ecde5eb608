//! Passphrase-based encryption for stored keys.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::StoreError;

pub const NONCE_LEN: usize = 12;
pub const SALT_LEN: usize = 16;

/// PBKDF2 work factor. The light setting keeps tests and CLI runs fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfStrength {
    Light,
    Standard,
}

impl KdfStrength {
    pub fn rounds(self) -> u32 {
        match self {
            KdfStrength::Light => 4_096,
            KdfStrength::Standard => 100_000,
        }
    }
}

/// What ends up on disk: the KDF parameters plus the AES-GCM blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedSecret {
    pub kdf: String,
    pub rounds: u32,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

fn derive_key(passphrase: &str, salt: &[u8], rounds: u32) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::<Hmac<Sha256>>(passphrase.as_bytes(), salt, rounds, &mut key[..]);
    key
}

pub fn seal(secret: &[u8], passphrase: &str, rounds: u32) -> Result<SealedSecret, StoreError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(passphrase, &salt, rounds);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| StoreError::Corrupted(format!("cipher init: {}", e)))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), secret)
        .map_err(|e| StoreError::Corrupted(format!("encryption failure: {:?}", e)))?;

    Ok(SealedSecret {
        kdf: "pbkdf2-hmac-sha256".to_string(),
        rounds,
        salt: hex::encode(salt),
        nonce: hex::encode(nonce_bytes),
        ciphertext: hex::encode(ciphertext),
    })
}

pub fn open(sealed: &SealedSecret, passphrase: &str) -> Result<Zeroizing<Vec<u8>>, StoreError> {
    let salt = hex::decode(&sealed.salt).map_err(|_| StoreError::Corrupted("salt".into()))?;
    let nonce = hex::decode(&sealed.nonce).map_err(|_| StoreError::Corrupted("nonce".into()))?;
    let ciphertext = hex::decode(&sealed.ciphertext)
        .map_err(|_| StoreError::Corrupted("ciphertext".into()))?;
    if nonce.len() != NONCE_LEN {
        return Err(StoreError::Corrupted(format!("nonce length {}", nonce.len())));
    }

    let key = derive_key(passphrase, &salt, sealed.rounds);
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| StoreError::Corrupted(format!("cipher init: {}", e)))?;

    // GCM authentication failure is indistinguishable from a wrong passphrase.
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| StoreError::WrongPassphrase)?;
    Ok(Zeroizing::new(plaintext))
}
