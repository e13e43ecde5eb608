//! Sign-and-submit for a single node-built transaction.

use tracing::{info, warn};

use crate::error::ExecError;
use crate::gateway::NodeGateway;
use crate::keystore::UnlockedKey;
use crate::transaction::{TxId, UnsignedTransaction};

/// Signs unsigned transactions with an unlocked key and broadcasts them.
///
/// One submission per call, no retry. A failed broadcast needs a freshly
/// built transaction, which only the caller can ask for.
pub struct TransactionController<'a, G: NodeGateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: NodeGateway + ?Sized> TransactionController<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub async fn execute(
        &self,
        key: &UnlockedKey,
        tx: UnsignedTransaction,
    ) -> Result<TxId, ExecError> {
        let txid = tx.txid();
        if let Some(reported) = tx.reported_txid() {
            if !reported.eq_ignore_ascii_case(&txid.to_hex()) {
                warn!(%txid, %reported, "node-reported txid differs from content hash");
            }
        }

        let signature = key
            .sign_digest(txid.as_bytes())
            .map_err(|e| ExecError::KeyFormat(format!("signing failed: {}", e)))?;
        let signed = tx.into_signed(signature);

        match self.gateway.broadcast(&signed).await {
            Ok(receipt) => {
                if let Some(node_txid) = receipt.txid.as_deref() {
                    let node_txid = node_txid.trim_start_matches("0x");
                    if !node_txid.eq_ignore_ascii_case(&txid.to_hex()) {
                        warn!(%txid, node_txid, "broadcast receipt carries a different txid");
                    }
                }
                info!(%txid, signer = %key.address(), "transaction accepted");
                Ok(txid)
            }
            Err(source) => {
                warn!(%txid, error = %source, "broadcast failed");
                Err(ExecError::Submission {
                    txid: txid.to_hex(),
                    source,
                })
            }
        }
    }
}
