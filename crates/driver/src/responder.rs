//! The responder module holds the [Responder] trait, which submits moves to a game.

use crate::{bindings::FaultDisputeGame, types, SignerMiddlewareWS, TxRequest};
use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, U256};
use fault_challenger_solvers::fault::{Claim, StepData};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The [Responder] trait defines the interface for submitting moves against a game. Each method
/// returns once the move has been accepted, or fails if it was not.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Attack the claim at `parent_index` with our `claim` at `position`.
    ///
    /// `position` is the new claim's position in our tree, where an attack on `p` lands at `2p`.
    /// The contract derives the position it records from `parent_index` alone.
    async fn attack(&self, parent_index: usize, position: u128, claim: Claim) -> Result<()>;

    /// Defend the claim at `parent_index` with our `claim` at `position`.
    ///
    /// `position` is the new claim's position in our tree, where a defense of `p` lands at
    /// `2p + 1`, and `claim` is our trace value there. The contract derives the position it
    /// records from `parent_index` alone, so implementations use `position` only for reporting.
    async fn defend(&self, parent_index: usize, position: u128, claim: Claim) -> Result<()>;

    /// Execute a single instruction against the leaf claim at `parent_index`.
    async fn step(
        &self,
        parent_index: usize,
        position: u128,
        is_attack: bool,
        step_data: &StepData,
    ) -> Result<()>;
}

/// The [FaultResponder] submits moves to a `FaultDisputeGame` through the transaction
/// dispatch channel.
#[derive(Debug, Clone)]
pub struct FaultResponder {
    /// The game contract binding.
    game: FaultDisputeGame<SignerMiddlewareWS>,
    /// The sending handle of the transaction dispatch channel.
    tx_sender: mpsc::Sender<TxRequest>,
}

impl FaultResponder {
    /// Creates a new [FaultResponder] for the game at `address`.
    pub fn new(
        address: Address,
        provider: Arc<SignerMiddlewareWS>,
        tx_sender: mpsc::Sender<TxRequest>,
    ) -> Self {
        Self {
            game: FaultDisputeGame::new(address, provider),
            tx_sender,
        }
    }
}

#[async_trait]
impl Responder for FaultResponder {
    async fn attack(&self, parent_index: usize, position: u128, claim: Claim) -> Result<()> {
        let call = self.game.attack(U256::from(parent_index), claim.0);
        let receipt = types::submit(&self.tx_sender, call.tx).await?;
        tracing::info!(target: "responder", parent_index, position, tx = ?receipt.transaction_hash, "Attack mined");
        Ok(())
    }

    async fn defend(&self, parent_index: usize, position: u128, claim: Claim) -> Result<()> {
        let call = self.game.defend(U256::from(parent_index), claim.0);
        let receipt = types::submit(&self.tx_sender, call.tx).await?;
        tracing::info!(target: "responder", parent_index, position, tx = ?receipt.transaction_hash, "Defense mined");
        Ok(())
    }

    async fn step(
        &self,
        parent_index: usize,
        position: u128,
        is_attack: bool,
        step_data: &StepData,
    ) -> Result<()> {
        let call = self.game.step(
            U256::from(parent_index),
            is_attack,
            step_data.pre_state.clone(),
            step_data.proof.clone(),
        );
        let receipt = types::submit(&self.tx_sender, call.tx).await?;
        tracing::info!(target: "responder", parent_index, position, is_attack, tx = ?receipt.transaction_hash, "Step mined");
        Ok(())
    }
}
