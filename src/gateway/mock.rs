//! In-memory gateway for tests and dry runs.
//!
//! Every `build` hands back a fresh payload derived from a call counter, so
//! two builds never share a content hash. Broadcast outcomes are pre-loaded
//! FIFO; with nothing queued the broadcast is accepted.
//!
//! Uses `std::sync::Mutex`; a poisoned lock surfaces as
//! [`GatewayError::Network`] rather than a panic.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use num_bigint::BigUint;
use serde_json::json;

use super::{BroadcastReceipt, GatewayError, NodeGateway, Operation};
use crate::address::Address;
use crate::resource::{RawDelegationList, RawResourceCounters};
use crate::transaction::{SignedTransaction, UnsignedTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCall {
    pub owner: Address,
    pub operation: Operation,
}

#[derive(Default)]
struct MockState {
    builds: Vec<BuildCall>,
    broadcasts: Vec<SignedTransaction>,
    build_failures: VecDeque<GatewayError>,
    broadcast_outcomes: VecDeque<Result<(), GatewayError>>,
    query_failures: VecDeque<GatewayError>,
    reported_txid: Option<String>,
    counters: RawResourceCounters,
    delegations: Vec<RawDelegationList>,
    balances: HashMap<(Address, Address), BigUint>,
    allowances: HashMap<(Address, Address, Address), BigUint>,
    queries: usize,
}

#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> GatewayError {
    GatewayError::Network(format!("mutex poisoned: {}", e))
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `build` fail with `err`.
    pub fn fail_next_build(&self, err: GatewayError) {
        if let Ok(mut state) = self.state.lock() {
            state.build_failures.push_back(err);
        }
    }

    /// Make the next `broadcast` fail with `err`.
    pub fn fail_next_broadcast(&self, err: GatewayError) {
        if let Ok(mut state) = self.state.lock() {
            state.broadcast_outcomes.push_back(Err(err));
        }
    }

    /// Make the next read-only query fail with `err`.
    pub fn fail_next_query(&self, err: GatewayError) {
        if let Ok(mut state) = self.state.lock() {
            state.query_failures.push_back(err);
        }
    }

    /// Report `txid` from every subsequent build instead of the true id.
    pub fn report_txid(&self, txid: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.reported_txid = Some(txid.into());
        }
    }

    pub fn set_resource_counters(&self, counters: RawResourceCounters) {
        if let Ok(mut state) = self.state.lock() {
            state.counters = counters;
        }
    }

    pub fn set_delegations(&self, lists: Vec<RawDelegationList>) {
        if let Ok(mut state) = self.state.lock() {
            state.delegations = lists;
        }
    }

    /// Unset balances read as zero, like an untouched TRC20 mapping.
    pub fn set_token_balance(&self, contract: Address, holder: Address, amount: BigUint) {
        if let Ok(mut state) = self.state.lock() {
            state.balances.insert((contract, holder), amount);
        }
    }

    pub fn set_token_allowance(
        &self,
        contract: Address,
        owner: Address,
        spender: Address,
        amount: BigUint,
    ) {
        if let Ok(mut state) = self.state.lock() {
            state.allowances.insert((contract, owner, spender), amount);
        }
    }

    pub fn builds(&self) -> Vec<BuildCall> {
        self.state.lock().map(|s| s.builds.clone()).unwrap_or_default()
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.state
            .lock()
            .map(|s| s.broadcasts.clone())
            .unwrap_or_default()
    }

    /// Total requests seen, queries included.
    pub fn call_count(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.builds.len() + s.broadcasts.len() + s.queries)
            .unwrap_or_default()
    }
}

#[async_trait]
impl NodeGateway for MockGateway {
    async fn build(
        &self,
        owner: &Address,
        operation: &Operation,
    ) -> Result<UnsignedTransaction, GatewayError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.builds.push(BuildCall {
            owner: *owner,
            operation: operation.clone(),
        });
        if let Some(err) = state.build_failures.pop_front() {
            return Err(err);
        }

        let nonce = state.builds.len() as u64;
        let mut raw = operation.name().as_bytes().to_vec();
        raw.extend_from_slice(owner.as_bytes());
        raw.extend_from_slice(&nonce.to_be_bytes());
        let raw_json = json!({ "operation": operation.name(), "nonce": nonce });
        Ok(UnsignedTransaction::from_node(
            raw,
            raw_json,
            state.reported_txid.clone(),
        ))
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastReceipt, GatewayError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.broadcasts.push(tx.clone());
        match state.broadcast_outcomes.pop_front() {
            Some(Err(err)) => Err(err),
            _ => Ok(BroadcastReceipt {
                txid: Some(tx.txid().to_hex()),
            }),
        }
    }

    async fn account_resource(
        &self,
        _address: &Address,
    ) -> Result<RawResourceCounters, GatewayError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.queries += 1;
        match state.query_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state.counters),
        }
    }

    async fn delegated_resources(
        &self,
        _address: &Address,
    ) -> Result<Vec<RawDelegationList>, GatewayError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.queries += 1;
        match state.query_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state.delegations.clone()),
        }
    }

    async fn token_balance(
        &self,
        contract: &Address,
        holder: &Address,
    ) -> Result<BigUint, GatewayError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.queries += 1;
        if let Some(err) = state.query_failures.pop_front() {
            return Err(err);
        }
        Ok(state
            .balances
            .get(&(*contract, *holder))
            .cloned()
            .unwrap_or_default())
    }

    async fn token_allowance(
        &self,
        contract: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<BigUint, GatewayError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state.queries += 1;
        if let Some(err) = state.query_failures.pop_front() {
            return Err(err);
        }
        Ok(state
            .allowances
            .get(&(*contract, *owner, *spender))
            .cloned()
            .unwrap_or_default())
    }
}

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<MockGateway>();
    }
    let _ = check;
};
