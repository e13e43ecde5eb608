//! Node gateway: the remote side that builds and accepts transactions.
//!
//! ```text
//! Operation + owner ──► NodeGateway::build ──► UnsignedTransaction
//! SignedTransaction ──► NodeGateway::broadcast ──► BroadcastReceipt | GatewayError
//! ```
//!
//! All per-operation payload shaping (ABI words, fee limits, freeze
//! durations) lives behind this trait. Implementations perform exactly one
//! request per call and never retry: a rebuilt transaction is a new
//! transaction with a new id.

pub mod abi;
pub mod http;
pub mod mock;

pub use http::HttpGateway;
pub use mock::MockGateway;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use num_bigint::BigUint;
use thiserror::Error;

use crate::address::Address;
use crate::resource::{RawDelegationList, RawResourceCounters};
use crate::transaction::{SignedTransaction, UnsignedTransaction};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("node rejected request ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("malformed node response: {0}")]
    InvalidResponse(String),
    #[error("invalid request parameter: {0}")]
    InvalidRequest(String),
}

/// Stake target for freeze/unfreeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Bandwidth,
    Energy,
}

impl Resource {
    /// Wire name used by the node API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Bandwidth => "BANDWIDTH",
            Resource::Energy => "ENERGY",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bandwidth" | "net" => Ok(Resource::Bandwidth),
            "energy" => Ok(Resource::Energy),
            _ => Err(format!("Invalid resource: {}. Allowed: bandwidth, energy", s)),
        }
    }
}

/// A state change the signer asks the node to build.
///
/// The signer's own address is the owner of every operation; it is passed to
/// [`NodeGateway::build`] separately so callers cannot mismatch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// TRC20 `approve(spender, amount)`.
    Approve {
        contract: Address,
        spender: Address,
        amount: BigUint,
    },
    /// TRC20 `transferFrom(from, to, amount)` spending an allowance.
    TransferFrom {
        contract: Address,
        from: Address,
        to: Address,
        amount: BigUint,
    },
    /// TRC20 `burn(amount)`.
    Burn { contract: Address, amount: BigUint },
    /// Stake `amount` sun for `resource`, credited to `receiver`.
    Freeze {
        receiver: Address,
        resource: Resource,
        amount: u64,
    },
    /// Release all stake for `resource` previously credited to `receiver`.
    Unfreeze { receiver: Address, resource: Resource },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Approve { .. } => "approve",
            Operation::TransferFrom { .. } => "transfer-from",
            Operation::Burn { .. } => "burn",
            Operation::Freeze { .. } => "freeze",
            Operation::Unfreeze { .. } => "unfreeze",
        }
    }
}

/// What the node says after accepting a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReceipt {
    /// The id the node assigned, if it reported one.
    pub txid: Option<String>,
}

#[async_trait]
pub trait NodeGateway: Send + Sync {
    /// Ask the node to build an unsigned transaction for `operation` owned by `owner`.
    async fn build(
        &self,
        owner: &Address,
        operation: &Operation,
    ) -> Result<UnsignedTransaction, GatewayError>;

    /// Submit a signed transaction. Rejection is an error, never a receipt.
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastReceipt, GatewayError>;

    async fn account_resource(
        &self,
        address: &Address,
    ) -> Result<RawResourceCounters, GatewayError>;

    /// One list per delegation counterpart, in node order.
    async fn delegated_resources(
        &self,
        address: &Address,
    ) -> Result<Vec<RawDelegationList>, GatewayError>;

    /// TRC20 `balanceOf(holder)` on `contract`, in raw token units.
    async fn token_balance(
        &self,
        contract: &Address,
        holder: &Address,
    ) -> Result<BigUint, GatewayError>;

    /// TRC20 `allowance(owner, spender)` on `contract`.
    async fn token_allowance(
        &self,
        contract: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<BigUint, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_parsing() {
        assert_eq!("energy".parse::<Resource>().unwrap(), Resource::Energy);
        assert_eq!("BANDWIDTH".parse::<Resource>().unwrap(), Resource::Bandwidth);
        assert!("cpu".parse::<Resource>().is_err());
        assert_eq!(Resource::Energy.to_string(), "ENERGY");
    }

    #[test]
    fn test_operation_names() {
        let c: Address = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".parse().unwrap();
        let op = Operation::Burn {
            contract: c,
            amount: BigUint::from(1u8),
        };
        assert_eq!(op.name(), "burn");
        let op = Operation::Unfreeze {
            receiver: c,
            resource: Resource::Energy,
        };
        assert_eq!(op.name(), "unfreeze");
    }

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Rejected {
            code: "SIGERROR".into(),
            message: "bad sig".into(),
        };
        assert!(err.to_string().contains("SIGERROR"));
        assert!(GatewayError::Timeout.to_string().contains("timed out"));
    }
}
