use num_bigint::BigUint;
use tempfile::TempDir;

use tron_exec::crypto::address_from_private_key_hex;
use tron_exec::gateway::{GatewayError, MockGateway};
use tron_exec::resource::{RawDelegatedResource, RawDelegationList, RawResourceCounters};
use tron_exec::{Address, ErrorKind, KdfStrength, KeyStore, Operation, Resource, TronExecutor};

const KEY: &str = "46a630a7169cd0f1a739f8ca6fb14ddf95717a82a97044c6c71773bcb898507f";
const CONTRACT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
const SPENDER: &str = "TYjBaCYBgngDA3nMpBD76Qk7qBx8twvDqY";
const OTHER: &str = "TEUmz9RLVXCBBg3ohoTWmN7dRDiAoXZygy";

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

fn setup() -> (TempDir, TronExecutor<MockGateway>) {
    let dir = TempDir::new().unwrap();
    let store = KeyStore::open(dir.path().join("keystore"), KdfStrength::Light).unwrap();
    (dir, TronExecutor::new(MockGateway::new(), store))
}

#[tokio::test]
async fn approve_imports_absent_key_and_returns_bare_txid() {
    let (_dir, exec) = setup();
    let owner = address_from_private_key_hex(KEY).unwrap();
    assert!(!exec.store().has_address(&owner));

    let txid = exec
        .approve(KEY, "", addr(CONTRACT), addr(SPENDER), BigUint::from(1000u32))
        .await
        .unwrap();

    let id = txid.to_string();
    assert_eq!(id.len(), 64);
    assert!(!id.starts_with("0x"));
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

    assert!(exec.store().has_address(&owner));

    let builds = exec.gateway().builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].owner, owner);
    assert_eq!(
        builds[0].operation,
        Operation::Approve {
            contract: addr(CONTRACT),
            spender: addr(SPENDER),
            amount: BigUint::from(1000u32),
        }
    );

    let sent = exec.gateway().broadcasts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].txid(), txid);
    assert!(sent[0].verify(&owner));
    assert!(!sent[0].verify(&addr(SPENDER)));
}

#[tokio::test]
async fn invalid_key_fails_before_any_node_call() {
    let (_dir, exec) = setup();
    for bad in ["not-hex", "0x1234", ""] {
        let err = exec
            .approve(bad, "", addr(CONTRACT), addr(SPENDER), BigUint::from(1u8))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyFormat);
    }
    assert_eq!(exec.gateway().call_count(), 0);
    assert!(exec.store().accounts().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_passphrase_fails_before_any_node_call() {
    let (_dir, exec) = setup();
    exec.burn(KEY, "secret", addr(CONTRACT), BigUint::from(5u8))
        .await
        .unwrap();
    let calls = exec.gateway().call_count();

    let err = exec
        .burn(KEY, "guess", addr(CONTRACT), BigUint::from(5u8))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialStore);
    assert_eq!(exec.gateway().call_count(), calls);
}

#[tokio::test]
async fn node_rejection_is_submission_error() {
    let (_dir, exec) = setup();
    exec.gateway().fail_next_broadcast(GatewayError::Rejected {
        code: "SIGERROR".into(),
        message: "validate signature error".into(),
    });

    let err = exec
        .transfer_from(
            KEY,
            "",
            addr(CONTRACT),
            addr(SPENDER),
            addr(OTHER),
            BigUint::from(42u8),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    // Exactly one attempt.
    assert_eq!(exec.gateway().broadcasts().len(), 1);
    assert_eq!(exec.gateway().builds().len(), 1);
}

#[tokio::test]
async fn build_failure_is_transaction_build_error() {
    let (_dir, exec) = setup();
    exec.gateway()
        .fail_next_build(GatewayError::InvalidResponse("no transaction".into()));

    let err = exec
        .unfreeze(KEY, "", addr(OTHER), Resource::Bandwidth)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionBuild);
    assert!(exec.gateway().broadcasts().is_empty());
}

#[tokio::test]
async fn repeated_operations_get_distinct_ids() {
    let (_dir, exec) = setup();
    let a = exec
        .freeze(KEY, "", addr(OTHER), Resource::Energy, 1_000_000)
        .await
        .unwrap();
    let b = exec
        .freeze(KEY, "", addr(OTHER), Resource::Energy, 1_000_000)
        .await
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(exec.store().accounts().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_operations_share_one_account() {
    let (_dir, exec) = setup();
    let contract = addr(CONTRACT);
    let (a, b) = tokio::join!(
        exec.burn(KEY, "", contract, BigUint::from(1u8)),
        exec.burn(KEY, "", contract, BigUint::from(2u8)),
    );
    assert_ne!(a.unwrap(), b.unwrap());
    assert_eq!(exec.store().accounts().unwrap().len(), 1);
}

#[tokio::test]
async fn resource_query_is_unclamped() {
    let (_dir, exec) = setup();
    exec.gateway().set_resource_counters(RawResourceCounters {
        net_limit: 1000,
        free_net_limit: 500,
        free_net_used: 200,
        net_used: 100,
        energy_limit: 10,
        energy_used: 30,
    });

    let snap = exec.resource(&addr(OTHER)).await.unwrap();
    assert_eq!(snap.bandwidth_available, 1200);
    assert_eq!(snap.energy_available, -20);
    assert_eq!(snap.usable_energy(), 0);
}

#[tokio::test]
async fn delegations_are_flattened_in_node_order() {
    let (_dir, exec) = setup();
    let entry = |to: &str, bw: i64| RawDelegatedResource {
        from: addr(SPENDER),
        to: addr(to),
        frozen_balance_for_bandwidth: bw,
        frozen_balance_for_energy: 0,
        expire_time_for_bandwidth: 1_700_000_000,
        expire_time_for_energy: 1_700_000_000_000,
    };
    exec.gateway().set_delegations(vec![
        RawDelegationList {
            entries: vec![entry(OTHER, 10_000_000)],
        },
        RawDelegationList {
            entries: vec![entry(CONTRACT, 2_500_000)],
        },
    ]);

    let records = exec.delegations(&addr(SPENDER)).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].to, addr(OTHER));
    assert_eq!(records[0].frozen_for_bandwidth.to_string(), "10.000000");
    assert_eq!(records[1].frozen_for_bandwidth.to_string(), "2.500000");
    assert_eq!(records[0].bandwidth_expiry, records[0].energy_expiry);
}

#[tokio::test]
async fn token_queries_do_not_build_transactions() {
    let (_dir, exec) = setup();
    let owner = address_from_private_key_hex(KEY).unwrap();
    exec.gateway()
        .set_token_balance(addr(CONTRACT), owner, BigUint::from(5_000_000u32));

    exec.approve(KEY, "", addr(CONTRACT), addr(SPENDER), BigUint::from(1000u32))
        .await
        .unwrap();
    exec.gateway().set_token_allowance(
        addr(CONTRACT),
        owner,
        addr(SPENDER),
        BigUint::from(1000u32),
    );

    let balance = exec.token_balance(&addr(CONTRACT), &owner).await.unwrap();
    assert_eq!(balance, BigUint::from(5_000_000u32));
    let allowance = exec
        .token_allowance(&addr(CONTRACT), &owner, &addr(SPENDER))
        .await
        .unwrap();
    assert_eq!(allowance, BigUint::from(1000u32));

    // An untouched holder reads as zero, not an error.
    let none = exec.token_balance(&addr(CONTRACT), &addr(OTHER)).await.unwrap();
    assert_eq!(none, BigUint::from(0u8));

    // Queries never build or broadcast.
    assert_eq!(exec.gateway().builds().len(), 1);
    assert_eq!(exec.gateway().broadcasts().len(), 1);
}

#[tokio::test]
async fn token_query_failure_is_query_error() {
    let (_dir, exec) = setup();
    exec.gateway().fail_next_query(GatewayError::Timeout);
    let err = exec
        .token_balance(&addr(CONTRACT), &addr(OTHER))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
}
