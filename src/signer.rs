//! Resolve a raw private key into an unlocked signing account.

use tracing::{debug, info};

use crate::address::Address;
use crate::crypto;
use crate::error::ExecError;
use crate::keystore::{Account, KeyStore, UnlockedKey};

/// A stored account plus its unlocked key, alive for one operation.
///
/// Dropping it wipes the key. It is not `Clone`, so nothing can keep the
/// secret past the call that resolved it.
#[derive(Debug)]
pub struct SigningAccount {
    account: Account,
    key: UnlockedKey,
}

impl SigningAccount {
    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn key(&self) -> &UnlockedKey {
        &self.key
    }
}

/// Find or import the account for `private_key_hex`, then unlock it.
///
/// The key is parsed before the store is touched, so a malformed key fails
/// with [`ExecError::KeyFormat`] and nothing else happens.
pub fn resolve_account(
    store: &KeyStore,
    private_key_hex: &str,
    passphrase: &str,
) -> Result<SigningAccount, ExecError> {
    let key = crypto::parse_private_key_hex(private_key_hex).map_err(ExecError::KeyFormat)?;
    let address = Address::from_public_key(key.verifying_key());

    let account = if store.has_address(&address) {
        debug!(%address, "using stored account");
        store.find(&address)?
    } else {
        info!(%address, "importing new account");
        store.import_key(&key, passphrase)?
    };
    drop(key);

    let key = store.unlock(&account, passphrase)?;
    Ok(SigningAccount { account, key })
}
