//! Shared type aliases and the transaction dispatch request.

use anyhow::{anyhow, Result};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Provider, Ws},
    signers::LocalWallet,
    types::{transaction::eip2718::TypedTransaction, TransactionReceipt},
};
use tokio::sync::{mpsc, oneshot};

/// The [SignerMiddlewareWS] type is a [SignerMiddleware] over a WebSocket [Provider] that signs
/// transactions with a [LocalWallet].
pub type SignerMiddlewareWS = SignerMiddleware<Provider<Ws>, LocalWallet>;

/// A [TxRequest] is a transaction queued for the [TxDispatchDriver](crate::TxDispatchDriver)
/// along with the channel its receipt is reported on.
#[derive(Debug)]
pub struct TxRequest {
    /// The transaction to sign and send.
    pub tx: TypedTransaction,
    /// Receives the mined receipt, or the reason the transaction was not mined.
    pub reply: oneshot::Sender<Result<TransactionReceipt>>,
}

/// Queues a transaction with the dispatcher and waits for it to be mined. Reverted transactions
/// are reported as errors.
pub async fn submit(
    tx_sender: &mpsc::Sender<TxRequest>,
    tx: TypedTransaction,
) -> Result<TransactionReceipt> {
    let (reply, receipt) = oneshot::channel();
    tx_sender
        .send(TxRequest { tx, reply })
        .await
        .map_err(|_| anyhow!("Transaction dispatch channel closed"))?;
    let receipt = receipt
        .await
        .map_err(|_| anyhow!("Transaction dispatcher dropped the request"))??;

    if receipt.status.map(|s| s.is_zero()).unwrap_or(false) {
        return Err(anyhow!(
            "Transaction {:?} reverted",
            receipt.transaction_hash
        ));
    }
    Ok(receipt)
}
