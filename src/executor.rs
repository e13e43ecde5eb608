//! High-level operations: resolve the signer, build, sign and submit.
//!
//! ```text
//! private key ──► resolve_account ──► SigningAccount
//!                                          │
//! Operation ──► NodeGateway::build ──► UnsignedTransaction
//!                                          │
//!                          TransactionController::execute ──► TxId
//! ```
//!
//! Every operation has the same shape; only the [`Operation`] differs. The
//! first failure along the chain is returned unchanged.

use num_bigint::BigUint;
use tracing::{debug, info};

use crate::address::Address;
use crate::controller::TransactionController;
use crate::error::ExecError;
use crate::gateway::{NodeGateway, Operation, Resource};
use crate::keystore::KeyStore;
use crate::resource::{
    compute_available_resources, decode_delegations, DelegatedResourceRecord, ResourceSnapshot,
};
use crate::signer::resolve_account;
use crate::transaction::TxId;

pub struct TronExecutor<G: NodeGateway> {
    gateway: G,
    store: KeyStore,
}

impl<G: NodeGateway> TronExecutor<G> {
    pub fn new(gateway: G, store: KeyStore) -> Self {
        Self { gateway, store }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    /// Run one operation signed by the owner of `private_key_hex`.
    pub async fn execute(
        &self,
        private_key_hex: &str,
        passphrase: &str,
        operation: Operation,
    ) -> Result<TxId, ExecError> {
        let signer = resolve_account(&self.store, private_key_hex, passphrase)?;
        let owner = signer.address();

        debug!(%owner, operation = operation.name(), "building transaction");
        let tx = self
            .gateway
            .build(&owner, &operation)
            .await
            .map_err(|source| ExecError::TransactionBuild {
                operation: operation.name(),
                source,
            })?;

        let txid = TransactionController::new(&self.gateway)
            .execute(signer.key(), tx)
            .await?;
        info!(%owner, %txid, operation = operation.name(), "operation submitted");
        Ok(txid)
    }

    pub async fn approve(
        &self,
        private_key_hex: &str,
        passphrase: &str,
        contract: Address,
        spender: Address,
        amount: BigUint,
    ) -> Result<TxId, ExecError> {
        let op = Operation::Approve {
            contract,
            spender,
            amount,
        };
        self.execute(private_key_hex, passphrase, op).await
    }

    pub async fn transfer_from(
        &self,
        private_key_hex: &str,
        passphrase: &str,
        contract: Address,
        from: Address,
        to: Address,
        amount: BigUint,
    ) -> Result<TxId, ExecError> {
        let op = Operation::TransferFrom {
            contract,
            from,
            to,
            amount,
        };
        self.execute(private_key_hex, passphrase, op).await
    }

    pub async fn burn(
        &self,
        private_key_hex: &str,
        passphrase: &str,
        contract: Address,
        amount: BigUint,
    ) -> Result<TxId, ExecError> {
        self.execute(private_key_hex, passphrase, Operation::Burn { contract, amount })
            .await
    }

    /// Stake `amount` sun for `resource`, credited to `receiver`.
    pub async fn freeze(
        &self,
        private_key_hex: &str,
        passphrase: &str,
        receiver: Address,
        resource: Resource,
        amount: u64,
    ) -> Result<TxId, ExecError> {
        let op = Operation::Freeze {
            receiver,
            resource,
            amount,
        };
        self.execute(private_key_hex, passphrase, op).await
    }

    pub async fn unfreeze(
        &self,
        private_key_hex: &str,
        passphrase: &str,
        receiver: Address,
        resource: Resource,
    ) -> Result<TxId, ExecError> {
        self.execute(private_key_hex, passphrase, Operation::Unfreeze { receiver, resource })
            .await
    }

    pub async fn resource(&self, address: &Address) -> Result<ResourceSnapshot, ExecError> {
        let raw = self
            .gateway
            .account_resource(address)
            .await
            .map_err(|source| ExecError::Query {
                what: "account resource",
                source,
            })?;
        Ok(compute_available_resources(&raw))
    }

    pub async fn delegations(
        &self,
        address: &Address,
    ) -> Result<Vec<DelegatedResourceRecord>, ExecError> {
        let lists = self
            .gateway
            .delegated_resources(address)
            .await
            .map_err(|source| ExecError::Query {
                what: "delegated resource",
                source,
            })?;
        Ok(decode_delegations(&lists).iter().collect())
    }

    /// TRC20 balance of `holder`, in raw token units.
    pub async fn token_balance(
        &self,
        contract: &Address,
        holder: &Address,
    ) -> Result<BigUint, ExecError> {
        self.gateway
            .token_balance(contract, holder)
            .await
            .map_err(|source| ExecError::Query {
                what: "token balance",
                source,
            })
    }

    /// How much `spender` may still move out of `owner`'s balance.
    pub async fn token_allowance(
        &self,
        contract: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<BigUint, ExecError> {
        self.gateway
            .token_allowance(contract, owner, spender)
            .await
            .map_err(|source| ExecError::Query {
                what: "token allowance",
                source,
            })
    }
}
