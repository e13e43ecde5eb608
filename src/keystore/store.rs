//! Account storage and unlocking

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::cipher::{self, KdfStrength, SealedSecret};
use super::StoreError;
use crate::address::Address;
use crate::crypto::{self, RecoverableSignature};

const KEYFILE_VERSION: u32 = 1;

/// A stored account. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct KeyFile {
    version: u32,
    address: Address,
    crypto: SealedSecret,
}

/// A decrypted signing key, valid for one operation.
///
/// The secret scalar is zeroized when this value is dropped, on every exit
/// path. It is deliberately neither `Clone` nor `Serialize`.
pub struct UnlockedKey {
    address: Address,
    key: SigningKey,
}

impl UnlockedKey {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, String> {
        crypto::sign_digest(&self.key, digest)
    }
}

impl std::fmt::Debug for UnlockedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedKey")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// File-backed key store rooted at an explicit directory.
pub struct KeyStore {
    dir: PathBuf,
    kdf: KdfStrength,
    // One lock per address so concurrent import/unlock of the same key serialize.
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("dir", &self.dir)
            .field("kdf", &self.kdf)
            .finish()
    }
}

impl KeyStore {
    /// Open (creating if needed) the store at `dir`.
    pub fn open(dir: impl Into<PathBuf>, kdf: KdfStrength) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            kdf,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, address: &Address) -> PathBuf {
        self.dir.join(format!("{}.json", address.to_base58()))
    }

    fn address_lock(&self, address: &Address) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(*address).or_default().clone()
    }

    pub fn has_address(&self, address: &Address) -> bool {
        self.path_for(address).is_file()
    }

    pub fn find(&self, address: &Address) -> Result<Account, StoreError> {
        let path = self.path_for(address);
        if !path.is_file() {
            return Err(StoreError::NotFound(address.to_base58()));
        }
        let file = read_keyfile(&path)?;
        if file.address != *address {
            return Err(StoreError::Corrupted(format!(
                "{} holds key for {}",
                path.display(),
                file.address
            )));
        }
        Ok(Account {
            address: *address,
            path,
        })
    }

    /// Encrypt `key` under `passphrase` and store it.
    ///
    /// Importing an address that is already present returns the existing account
    /// untouched.
    pub fn import_key(&self, key: &SigningKey, passphrase: &str) -> Result<Account, StoreError> {
        let address = Address::from_public_key(key.verifying_key());
        let lock = self.address_lock(&address);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if self.has_address(&address) {
            debug!(%address, "key already imported");
            return self.find(&address);
        }

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&key.to_bytes());
        let sealed = cipher::seal(&secret[..], passphrase, self.kdf.rounds())?;
        let file = KeyFile {
            version: KEYFILE_VERSION,
            address,
            crypto: sealed,
        };

        let path = self.path_for(&address);
        write_keyfile(&path, &file)?;
        info!(%address, path = %path.display(), "imported key");

        Ok(Account { address, path })
    }

    pub fn import_hex(
        &self,
        private_key_hex: &str,
        passphrase: &str,
    ) -> Result<Account, StoreError> {
        let key = crypto::parse_private_key_hex(private_key_hex).map_err(StoreError::KeyFormat)?;
        self.import_key(&key, passphrase)
    }

    /// Decrypt the account's key. The decrypted key is checked against the
    /// stored address before it is handed out.
    pub fn unlock(&self, account: &Account, passphrase: &str) -> Result<UnlockedKey, StoreError> {
        let lock = self.address_lock(&account.address);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let file = read_keyfile(&account.path)?;
        let secret = cipher::open(&file.crypto, passphrase)?;
        let key = SigningKey::from_slice(&secret)
            .map_err(|_| StoreError::Corrupted("stored secret is not a valid key".into()))?;

        let derived = Address::from_public_key(key.verifying_key());
        if derived != account.address || derived != file.address {
            return Err(StoreError::Corrupted(format!(
                "decrypted key belongs to {}, expected {}",
                derived, account.address
            )));
        }

        debug!(address = %account.address, "unlocked key");
        Ok(UnlockedKey {
            address: derived,
            key,
        })
    }

    /// All accounts currently on disk.
    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut accounts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if let Ok(address) = Address::from_base58(stem) {
                accounts.push(Account { address, path });
            }
        }
        accounts.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(accounts)
    }
}

fn read_keyfile(path: &Path) -> Result<KeyFile, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let file: KeyFile = serde_json::from_str(&content)
        .map_err(|e| StoreError::Corrupted(format!("{}: {}", path.display(), e)))?;
    if file.version != KEYFILE_VERSION {
        return Err(StoreError::Corrupted(format!(
            "{}: unsupported version {}",
            path.display(),
            file.version
        )));
    }
    Ok(file)
}

fn write_keyfile(path: &Path, file: &KeyFile) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(file)
        .map_err(|e| StoreError::Corrupted(format!("serialize: {}", e)))?;

    // Write then rename so a crash never leaves a half-written key file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
            .map_err(|e| StoreError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}
