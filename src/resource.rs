//! Resource accounting: raw node counters to usable balances.
//!
//! Everything here is pure. Negative results are kept as-is: the node's
//! counters can lag each other, and clamping is the caller's decision
//! (see [`ResourceSnapshot::usable_bandwidth`]).

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Fractional digits of the chain's base denomination (1 TRX = 10^6 sun).
pub const SUN_DECIMALS: u32 = 6;

/// Counters as reported by `getaccountresource`. Absent fields mean zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResourceCounters {
    #[serde(rename = "freeNetLimit", default)]
    pub free_net_limit: i64,
    #[serde(rename = "freeNetUsed", default)]
    pub free_net_used: i64,
    #[serde(rename = "NetLimit", default)]
    pub net_limit: i64,
    #[serde(rename = "NetUsed", default)]
    pub net_used: i64,
    #[serde(rename = "EnergyLimit", default)]
    pub energy_limit: i64,
    #[serde(rename = "EnergyUsed", default)]
    pub energy_used: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceSnapshot {
    pub bandwidth_available: i64,
    pub energy_available: i64,
}

impl ResourceSnapshot {
    pub fn usable_bandwidth(&self) -> u64 {
        self.bandwidth_available.max(0) as u64
    }

    pub fn usable_energy(&self) -> u64 {
        self.energy_available.max(0) as u64
    }
}

/// Free-tier plus staked bandwidth minus both usages; staked energy minus usage.
///
/// Arithmetic wraps on overflow, as two's-complement i64 does on the node
/// side, so absurd counters yield absurd values rather than a panic.
pub fn compute_available_resources(raw: &RawResourceCounters) -> ResourceSnapshot {
    let bandwidth = raw
        .net_limit
        .wrapping_add(raw.free_net_limit)
        .wrapping_sub(raw.free_net_used)
        .wrapping_sub(raw.net_used);
    ResourceSnapshot {
        bandwidth_available: bandwidth,
        energy_available: raw.energy_limit.wrapping_sub(raw.energy_used),
    }
}

/// One delegation entry as the node reports it.
///
/// Note the units: `expire_time_for_bandwidth` arrives in seconds while
/// `expire_time_for_energy` arrives in milliseconds. An expiry outside the
/// range `chrono` can represent decodes as the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDelegatedResource {
    pub from: Address,
    pub to: Address,
    pub frozen_balance_for_bandwidth: i64,
    pub frozen_balance_for_energy: i64,
    pub expire_time_for_bandwidth: i64,
    pub expire_time_for_energy: i64,
}

/// All delegations between one pair of accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDelegationList {
    pub entries: Vec<RawDelegatedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegatedResourceRecord {
    pub from: Address,
    pub to: Address,
    pub frozen_for_bandwidth: Decimal,
    pub frozen_for_energy: Decimal,
    pub bandwidth_expiry: DateTime<Utc>,
    pub energy_expiry: DateTime<Utc>,
}

impl DelegatedResourceRecord {
    /// Scale balances to TRX and normalize both expiries to absolute time.
    ///
    /// The energy expiry is divided by 1000 (truncating) and the bandwidth
    /// expiry is not. This mirrors what the node protocol reports and is
    /// intentionally preserved.
    pub fn from_raw(raw: &RawDelegatedResource) -> Self {
        Self {
            from: raw.from,
            to: raw.to,
            frozen_for_bandwidth: Decimal::new(raw.frozen_balance_for_bandwidth, SUN_DECIMALS),
            frozen_for_energy: Decimal::new(raw.frozen_balance_for_energy, SUN_DECIMALS),
            bandwidth_expiry: unix_seconds(raw.expire_time_for_bandwidth),
            energy_expiry: unix_seconds(raw.expire_time_for_energy / 1000),
        }
    }
}

// Out-of-range seconds fall back to 1970-01-01T00:00:00Z.
fn unix_seconds(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Lazy view over a node's delegation lists.
///
/// Iterating decodes entries on the fly, flattening the per-counterpart lists
/// in node order. The view is `Copy`, so it can be walked any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Delegations<'a> {
    lists: &'a [RawDelegationList],
}

impl<'a> Delegations<'a> {
    pub fn iter(&self) -> DelegationIter<'a> {
        DelegationIter {
            lists: self.lists,
            list: 0,
            entry: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(|l| l.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for Delegations<'a> {
    type Item = DelegatedResourceRecord;
    type IntoIter = DelegationIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct DelegationIter<'a> {
    lists: &'a [RawDelegationList],
    list: usize,
    entry: usize,
}

impl Iterator for DelegationIter<'_> {
    type Item = DelegatedResourceRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.lists.get(self.list) {
            if let Some(raw) = current.entries.get(self.entry) {
                self.entry += 1;
                return Some(DelegatedResourceRecord::from_raw(raw));
            }
            self.list += 1;
            self.entry = 0;
        }
        None
    }
}

pub fn decode_delegations(lists: &[RawDelegationList]) -> Delegations<'_> {
    Delegations { lists }
}
