//! The oracle module holds the [OracleUpdater] trait, which makes the preimages a step reads
//! available on-chain before the step is submitted.

use crate::{bindings::PreimageOracle, types, SignerMiddlewareWS, TxRequest};
use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, U256};
use fault_challenger_solvers::fault::TraceAccessor;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The [OracleUpdater] trait defines the interface for publishing the oracle data needed to
/// execute a step at a given leaf position.
#[async_trait]
pub trait OracleUpdater: Send + Sync {
    /// Publish the oracle data read by the step at `position`.
    async fn publish(&self, position: u128) -> Result<()>;
}

/// An [OracleUpdater] for traces whose steps never read from the preimage oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOracleUpdater;

#[async_trait]
impl OracleUpdater for NoopOracleUpdater {
    async fn publish(&self, _: u128) -> Result<()> {
        Ok(())
    }
}

/// The [ContractOracleUpdater] loads preimage parts into the `PreimageOracle` contract.
pub struct ContractOracleUpdater {
    /// The preimage oracle binding.
    oracle: PreimageOracle<SignerMiddlewareWS>,
    /// The trace the step data is sourced from.
    trace: Arc<dyn TraceAccessor>,
    /// The sending handle of the transaction dispatch channel.
    tx_sender: mpsc::Sender<TxRequest>,
}

impl ContractOracleUpdater {
    /// Creates a new [ContractOracleUpdater] for the preimage oracle at `address`.
    pub fn new(
        address: Address,
        provider: Arc<SignerMiddlewareWS>,
        trace: Arc<dyn TraceAccessor>,
        tx_sender: mpsc::Sender<TxRequest>,
    ) -> Self {
        Self {
            oracle: PreimageOracle::new(address, provider),
            trace,
            tx_sender,
        }
    }
}

#[async_trait]
impl OracleUpdater for ContractOracleUpdater {
    async fn publish(&self, position: u128) -> Result<()> {
        let Some(oracle_data) = self.trace.get_step_data(position).await?.oracle_data else {
            return Ok(());
        };

        tracing::debug!(target: "oracle-updater", position, key = ?oracle_data.key, "Loading preimage part");
        let call = self.oracle.method::<_, ()>(
            "loadKeccak256PreimagePart",
            (U256::from(oracle_data.offset), oracle_data.data),
        )?;
        types::submit(&self.tx_sender, call.tx).await?;
        Ok(())
    }
}
