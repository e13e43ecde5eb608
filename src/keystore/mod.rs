//! Encrypted on-disk key storage.
//!
//! Keys are held at rest as one JSON file per address under an explicit
//! directory. Nothing here caches decrypted material: [`KeyStore::unlock`]
//! hands out an [`UnlockedKey`] that wipes its secret when dropped.

pub mod cipher;
pub mod store;

pub use cipher::KdfStrength;
pub use store::{Account, KeyStore, UnlockedKey};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("keystore I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no account for address {0}")]
    NotFound(String),
    #[error("wrong passphrase")]
    WrongPassphrase,
    #[error("invalid key material: {0}")]
    KeyFormat(String),
    #[error("corrupted keystore entry: {0}")]
    Corrupted(String),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
