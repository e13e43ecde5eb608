//! Client-side TRON transaction execution.
//!
//! Resolves a signing account from a raw private key, has a node build the
//! unsigned transaction, signs it locally and broadcasts it. Read-only helpers
//! turn node resource counters into usable balances.

pub mod address;
pub mod cli;
pub mod config;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod keystore;
pub mod resource;
pub mod signer;
pub mod transaction;

pub use address::Address;
pub use controller::TransactionController;
pub use error::{ErrorKind, ExecError};
pub use executor::TronExecutor;
pub use gateway::{NodeGateway, Operation, Resource};
pub use keystore::{KdfStrength, KeyStore};
pub use resource::{DelegatedResourceRecord, ResourceSnapshot};
pub use signer::{resolve_account, SigningAccount};
pub use transaction::{SignedTransaction, TxId, UnsignedTransaction};
