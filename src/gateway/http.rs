// Node gateway over the TronGrid HTTP wallet API
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::abi::{self, Token};
use super::{BroadcastReceipt, GatewayError, NodeGateway, Operation, Resource};
use crate::address::Address;
use crate::config::{NodeConfig, TransactionConfig, MAINNET_URL, SHASTA_URL};
use crate::resource::{RawDelegatedResource, RawDelegationList, RawResourceCounters};
use crate::transaction::{SignedTransaction, UnsignedTransaction};

pub struct HttpGateway {
    api_url: String,
    api_key: Option<String>,
    client: Client,
    fee_limit: i64,
    freeze_duration_days: i64,
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl HttpGateway {
    pub fn new(node: &NodeConfig, tx: &TransactionConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(node.timeout_secs))
            .build()?;
        Ok(Self {
            api_url: node.url.trim_end_matches('/').to_string(),
            api_key: node.api_key.clone(),
            client,
            fee_limit: tx.fee_limit,
            freeze_duration_days: tx.freeze_duration_days,
        })
    }

    pub fn mainnet(api_key: Option<String>) -> Result<Self, GatewayError> {
        Self::with_url(MAINNET_URL, api_key)
    }

    pub fn testnet(api_key: Option<String>) -> Result<Self, GatewayError> {
        Self::with_url(SHASTA_URL, api_key)
    }

    fn with_url(url: &str, api_key: Option<String>) -> Result<Self, GatewayError> {
        let node = NodeConfig {
            url: url.to_string(),
            api_key,
            timeout_secs: 30,
            log_level: "info".to_string(),
        };
        Self::new(&node, &TransactionConfig::default())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("TRON-PRO-API-KEY", key);
        }

        debug!(%url, "node request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_server_error() {
            return Err(GatewayError::Network(format!("HTTP {}: {}", status, text)));
        }
        if !status.is_success() {
            return Err(GatewayError::Rejected {
                code: format!("HTTP {}", status.as_u16()),
                message: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(format!("{}: {} ({})", path, e, text)))
    }

    async fn trigger_contract(
        &self,
        owner: &Address,
        contract: &Address,
        selector: &str,
        params: &[Token],
    ) -> Result<UnsignedTransaction, GatewayError> {
        let body = json!({
            "owner_address": owner.to_hex(),
            "contract_address": contract.to_hex(),
            "function_selector": selector,
            "parameter": abi::encode_params(params)?,
            "fee_limit": self.fee_limit,
            "call_value": 0,
            "visible": false,
        });
        let response: TriggerResponse = self.post("/wallet/triggersmartcontract", &body).await?;

        if !response.result.result {
            return Err(GatewayError::Rejected {
                code: response.result.code.unwrap_or_else(|| "UNKNOWN".to_string()),
                message: decode_node_message(response.result.message.as_deref().unwrap_or("")),
            });
        }
        response
            .transaction
            .ok_or_else(|| GatewayError::InvalidResponse("no transaction in response".into()))?
            .into_unsigned()
    }

    /// Read-only contract call; returns the first `uint256` it yields.
    async fn constant_uint(
        &self,
        caller: &Address,
        contract: &Address,
        selector: &str,
        params: &[Token],
    ) -> Result<BigUint, GatewayError> {
        let body = json!({
            "owner_address": caller.to_hex(),
            "contract_address": contract.to_hex(),
            "function_selector": selector,
            "parameter": abi::encode_params(params)?,
            "visible": false,
        });
        let response: ConstantResponse =
            self.post("/wallet/triggerconstantcontract", &body).await?;
        response.into_uint()
    }

    async fn freeze(
        &self,
        owner: &Address,
        receiver: &Address,
        resource: Resource,
        amount: u64,
    ) -> Result<UnsignedTransaction, GatewayError> {
        let mut body = json!({
            "owner_address": owner.to_hex(),
            "frozen_balance": amount,
            "frozen_duration": self.freeze_duration_days,
            "resource": resource.as_str(),
            "visible": false,
        });
        // The node refuses a receiver equal to the owner.
        if receiver != owner {
            body["receiver_address"] = json!(receiver.to_hex());
        }
        let tx: NodeTransaction = self.post("/wallet/freezebalance", &body).await?;
        tx.into_unsigned()
    }

    async fn unfreeze(
        &self,
        owner: &Address,
        receiver: &Address,
        resource: Resource,
    ) -> Result<UnsignedTransaction, GatewayError> {
        let mut body = json!({
            "owner_address": owner.to_hex(),
            "resource": resource.as_str(),
            "visible": false,
        });
        if receiver != owner {
            body["receiver_address"] = json!(receiver.to_hex());
        }
        let tx: NodeTransaction = self.post("/wallet/unfreezebalance", &body).await?;
        tx.into_unsigned()
    }
}

#[async_trait]
impl NodeGateway for HttpGateway {
    async fn build(
        &self,
        owner: &Address,
        operation: &Operation,
    ) -> Result<UnsignedTransaction, GatewayError> {
        match operation {
            Operation::Approve {
                contract,
                spender,
                amount,
            } => {
                let params = [Token::Address(*spender), Token::Uint(amount.clone())];
                self.trigger_contract(owner, contract, "approve(address,uint256)", &params)
                    .await
            }
            Operation::TransferFrom {
                contract,
                from,
                to,
                amount,
            } => {
                let params = [
                    Token::Address(*from),
                    Token::Address(*to),
                    Token::Uint(amount.clone()),
                ];
                self.trigger_contract(
                    owner,
                    contract,
                    "transferFrom(address,address,uint256)",
                    &params,
                )
                .await
            }
            Operation::Burn { contract, amount } => {
                let params = [Token::Uint(amount.clone())];
                self.trigger_contract(owner, contract, "burn(uint256)", &params)
                    .await
            }
            Operation::Freeze {
                receiver,
                resource,
                amount,
            } => self.freeze(owner, receiver, *resource, *amount).await,
            Operation::Unfreeze { receiver, resource } => {
                self.unfreeze(owner, receiver, *resource).await
            }
        }
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastReceipt, GatewayError> {
        let body = serde_json::to_value(tx.to_broadcast_body())
            .map_err(|e| GatewayError::InvalidRequest(format!("serialize transaction: {}", e)))?;
        let response: BroadcastResponse = self.post("/wallet/broadcasttransaction", &body).await?;

        if response.result {
            Ok(BroadcastReceipt {
                txid: response.txid,
            })
        } else {
            Err(GatewayError::Rejected {
                code: response.code.unwrap_or_else(|| "UNKNOWN".to_string()),
                message: decode_node_message(response.message.as_deref().unwrap_or("")),
            })
        }
    }

    async fn account_resource(
        &self,
        address: &Address,
    ) -> Result<RawResourceCounters, GatewayError> {
        let body = json!({ "address": address.to_hex(), "visible": false });
        self.post("/wallet/getaccountresource", &body).await
    }

    async fn delegated_resources(
        &self,
        address: &Address,
    ) -> Result<Vec<RawDelegationList>, GatewayError> {
        let body = json!({ "value": address.to_hex(), "visible": false });
        let index: DelegationIndex = self
            .post("/wallet/getdelegatedresourceaccountindex", &body)
            .await?;

        let mut lists = Vec::with_capacity(index.to_accounts.len());
        for to in &index.to_accounts {
            let body = json!({
                "fromAddress": address.to_hex(),
                "toAddress": to,
                "visible": false,
            });
            let response: DelegatedResourceResponse =
                self.post("/wallet/getdelegatedresource", &body).await?;
            let entries = response
                .delegated_resource
                .into_iter()
                .map(NodeDelegatedResource::into_raw)
                .collect::<Result<Vec<_>, _>>()?;
            lists.push(RawDelegationList { entries });
        }
        Ok(lists)
    }

    async fn token_balance(
        &self,
        contract: &Address,
        holder: &Address,
    ) -> Result<BigUint, GatewayError> {
        let params = [Token::Address(*holder)];
        self.constant_uint(holder, contract, "balanceOf(address)", &params)
            .await
    }

    async fn token_allowance(
        &self,
        contract: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<BigUint, GatewayError> {
        let params = [Token::Address(*owner), Token::Address(*spender)];
        self.constant_uint(owner, contract, "allowance(address,address)", &params)
            .await
    }
}

/// Node messages often arrive hex-encoded; show them as text when they decode.
pub fn decode_node_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}

#[derive(Debug, Deserialize)]
struct NodeTransaction {
    #[serde(rename = "txID")]
    txid: Option<String>,
    #[serde(default)]
    raw_data: Value,
    raw_data_hex: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl NodeTransaction {
    fn into_unsigned(self) -> Result<UnsignedTransaction, GatewayError> {
        if let Some(error) = self.error {
            return Err(GatewayError::Rejected {
                code: "CONTRACT_VALIDATE_ERROR".to_string(),
                message: error,
            });
        }
        let raw_hex = self
            .raw_data_hex
            .ok_or_else(|| GatewayError::InvalidResponse("missing raw_data_hex".into()))?;
        let raw = hex::decode(&raw_hex)
            .map_err(|e| GatewayError::InvalidResponse(format!("raw_data_hex: {}", e)))?;
        if raw.is_empty() {
            return Err(GatewayError::InvalidResponse("empty raw_data_hex".into()));
        }
        Ok(UnsignedTransaction::from_node(raw, self.raw_data, self.txid))
    }
}

#[derive(Debug, Deserialize)]
struct TriggerResult {
    #[serde(default)]
    result: bool,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    result: TriggerResult,
    transaction: Option<NodeTransaction>,
}

#[derive(Debug, Deserialize)]
struct ConstantResponse {
    result: TriggerResult,
    #[serde(default)]
    constant_result: Vec<String>,
}

impl ConstantResponse {
    fn into_uint(self) -> Result<BigUint, GatewayError> {
        if !self.result.result {
            return Err(GatewayError::Rejected {
                code: self.result.code.unwrap_or_else(|| "UNKNOWN".to_string()),
                message: decode_node_message(self.result.message.as_deref().unwrap_or("")),
            });
        }
        let word = self
            .constant_result
            .first()
            .ok_or_else(|| GatewayError::InvalidResponse("empty constant_result".into()))?;
        abi::decode_uint(word)
    }
}

#[derive(Debug, Deserialize)]
struct BroadcastResponse {
    #[serde(default)]
    result: bool,
    txid: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DelegationIndex {
    #[serde(rename = "toAccounts", default)]
    to_accounts: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DelegatedResourceResponse {
    #[serde(rename = "delegatedResource", default)]
    delegated_resource: Vec<NodeDelegatedResource>,
}

#[derive(Debug, Deserialize)]
struct NodeDelegatedResource {
    from: String,
    to: String,
    #[serde(default)]
    frozen_balance_for_bandwidth: i64,
    #[serde(default)]
    frozen_balance_for_energy: i64,
    #[serde(default)]
    expire_time_for_bandwidth: i64,
    #[serde(default)]
    expire_time_for_energy: i64,
}

impl NodeDelegatedResource {
    fn into_raw(self) -> Result<RawDelegatedResource, GatewayError> {
        let parse = |s: &str| {
            s.parse::<Address>().map_err(|e| {
                GatewayError::InvalidResponse(format!("delegation address {}: {}", s, e))
            })
        };
        Ok(RawDelegatedResource {
            from: parse(&self.from)?,
            to: parse(&self.to)?,
            frozen_balance_for_bandwidth: self.frozen_balance_for_bandwidth,
            frozen_balance_for_energy: self.frozen_balance_for_energy,
            expire_time_for_bandwidth: self.expire_time_for_bandwidth,
            expire_time_for_energy: self.expire_time_for_energy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let mainnet = HttpGateway::mainnet(None).unwrap();
        assert_eq!(mainnet.api_url(), "https://api.trongrid.io");
        assert!(mainnet.api_key.is_none());

        let testnet = HttpGateway::testnet(Some("test-key".to_string())).unwrap();
        assert_eq!(testnet.api_url(), "https://api.shasta.trongrid.io");
        assert_eq!(testnet.api_key, Some("test-key".to_string()));
        assert_eq!(testnet.fee_limit, 100_000_000);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let node = NodeConfig {
            url: "http://127.0.0.1:8090/".into(),
            api_key: None,
            timeout_secs: 5,
            log_level: "debug".into(),
        };
        let gw = HttpGateway::new(&node, &TransactionConfig::default()).unwrap();
        assert_eq!(gw.api_url(), "http://127.0.0.1:8090");
    }

    #[test]
    fn test_decode_node_message() {
        // "balance is not sufficient" hex-encoded, as the node sends it.
        let encoded = hex::encode("balance is not sufficient");
        assert_eq!(decode_node_message(&encoded), "balance is not sufficient");
        assert_eq!(decode_node_message("plain text"), "plain text");
    }

    #[test]
    fn test_node_transaction_parsing() {
        let ok: NodeTransaction = serde_json::from_value(json!({
            "txID": "ab",
            "raw_data": {"expiration": 1},
            "raw_data_hex": "0a02",
        }))
        .unwrap();
        let tx = ok.into_unsigned().unwrap();
        assert_eq!(tx.raw(), &[0x0a, 0x02]);
        assert_eq!(tx.reported_txid(), Some("ab"));

        let err: NodeTransaction = serde_json::from_value(json!({
            "Error": "frozenBalance must be more than 1TRX",
        }))
        .unwrap();
        assert!(matches!(err.into_unsigned(), Err(GatewayError::Rejected { .. })));

        let missing: NodeTransaction = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(missing.into_unsigned(), Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_trigger_response_failure_shape() {
        let response: TriggerResponse = serde_json::from_value(json!({
            "result": {"code": "CONTRACT_VALIDATE_ERROR", "message": hex::encode("no contract")},
        }))
        .unwrap();
        assert!(!response.result.result);
        assert!(response.transaction.is_none());
    }

    #[test]
    fn test_constant_result_parsing() {
        let ok: ConstantResponse = serde_json::from_value(json!({
            "result": {"result": true},
            "constant_result": [format!("{:0>64x}", 1_000_000u64)],
        }))
        .unwrap();
        assert_eq!(ok.into_uint().unwrap(), BigUint::from(1_000_000u64));

        let reverted: ConstantResponse = serde_json::from_value(json!({
            "result": {
                "code": "CONTRACT_EXE_ERROR",
                "message": hex::encode("REVERT opcode executed"),
            },
        }))
        .unwrap();
        match reverted.into_uint() {
            Err(GatewayError::Rejected { code, message }) => {
                assert_eq!(code, "CONTRACT_EXE_ERROR");
                assert_eq!(message, "REVERT opcode executed");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let empty: ConstantResponse =
            serde_json::from_value(json!({"result": {"result": true}})).unwrap();
        assert!(matches!(empty.into_uint(), Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_delegation_parsing() {
        let response: DelegatedResourceResponse = serde_json::from_value(json!({
            "delegatedResource": [{
                "from": "41f9a3e08462676a1ea7935d1fe8c561e909886f95",
                "to": "4131781992ff46410f0429aecc1420ffc91e07a1f6",
                "frozen_balance_for_energy": 10_000_000,
                "expire_time_for_energy": 1_700_000_000_000i64,
            }],
        }))
        .unwrap();
        let raw = response
            .delegated_resource
            .into_iter()
            .map(NodeDelegatedResource::into_raw)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].from.to_base58(), "TYjBaCYBgngDA3nMpBD76Qk7qBx8twvDqY");
        assert_eq!(raw[0].frozen_balance_for_bandwidth, 0);

        let empty: DelegationIndex = serde_json::from_value(json!({})).unwrap();
        assert!(empty.to_accounts.is_empty());
    }
}
