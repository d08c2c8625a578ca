//! The loader module holds the [GameLoader] trait, the read-only view of a game's on-chain state.

use crate::{bindings::FaultDisputeGame, SignerMiddlewareWS};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use fault_challenger_solvers::fault::{Claim, ClaimData, GameStatus};
use std::sync::Arc;

/// The [GameLoader] trait defines the read-only interface to the state of a single dispute game.
/// Every read may fail transiently.
#[async_trait]
pub trait GameLoader: Send + Sync {
    /// Fetch the current [GameStatus] of the game.
    async fn get_status(&self) -> Result<GameStatus>;

    /// Fetch the number of claims made in the game.
    async fn get_claim_count(&self) -> Result<u64>;

    /// Fetch the maximum depth of the game tree.
    async fn get_max_game_depth(&self) -> Result<u64>;

    /// Fetch every claim in the game, in on-chain order.
    async fn get_claims(&self) -> Result<Vec<ClaimData>>;

    /// Fetch the absolute prestate the game was created with.
    async fn get_absolute_prestate(&self) -> Result<Claim>;
}

/// The [FaultDisputeGameContract] is a [GameLoader] backed by a deployed `FaultDisputeGame`.
#[derive(Debug, Clone)]
pub struct FaultDisputeGameContract {
    /// The contract binding.
    contract: FaultDisputeGame<SignerMiddlewareWS>,
}

impl FaultDisputeGameContract {
    /// Creates a new [FaultDisputeGameContract] for the game at `address`.
    pub fn new(address: Address, provider: Arc<SignerMiddlewareWS>) -> Self {
        Self {
            contract: FaultDisputeGame::new(address, provider),
        }
    }

    /// Returns the address of the game.
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Fetch the claim at `index` in the on-chain claim array.
    async fn get_claim(&self, index: u64) -> Result<ClaimData> {
        let (parent_index, countered_by, claimant, _bond, claim, position, _clock) =
            self.contract.claim_data(U256::from(index)).call().await?;

        Ok(ClaimData {
            contract_index: index as usize,
            parent_index: (parent_index != u32::MAX).then_some(parent_index as usize),
            countered: !countered_by.is_zero(),
            claimant,
            claim: Claim::from(claim),
            position,
        })
    }
}

#[async_trait]
impl GameLoader for FaultDisputeGameContract {
    async fn get_status(&self) -> Result<GameStatus> {
        GameStatus::try_from(self.contract.status().call().await?)
    }

    async fn get_claim_count(&self) -> Result<u64> {
        let count = self.contract.claim_data_len().call().await?;
        if count > U256::from(u64::MAX) {
            return Err(anyhow!("Claim count out of range: {}", count));
        }
        Ok(count.as_u64())
    }

    async fn get_max_game_depth(&self) -> Result<u64> {
        let depth = self.contract.max_game_depth().call().await?;
        if depth > U256::from(u64::MAX) {
            return Err(anyhow!("Game depth out of range: {}", depth));
        }
        Ok(depth.as_u64())
    }

    async fn get_claims(&self) -> Result<Vec<ClaimData>> {
        let count = self.get_claim_count().await?;
        let mut claims = Vec::with_capacity(count as usize);
        for index in 0..count {
            claims.push(self.get_claim(index).await?);
        }
        Ok(claims)
    }

    async fn get_absolute_prestate(&self) -> Result<Claim> {
        Ok(Claim::from(self.contract.absolute_prestate().call().await?))
    }
}
