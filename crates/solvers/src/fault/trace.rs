//! The trace module holds the [TraceAccessor] trait.

use super::{Claim, StepData};
use anyhow::Result;
use async_trait::async_trait;

/// The [TraceAccessor] trait defines the interface for independently recomputing the canonical
/// execution trace of a game. Values returned by a [TraceAccessor] are always correct in the
/// relative view of the participant.
#[async_trait]
pub trait TraceAccessor: Send + Sync {
    /// Fetch the [Claim] at the given position in the game tree.
    ///
    /// ### Takes
    /// - `position`: The position of the claim within the game tree.
    ///
    /// ### Returns
    /// - `Ok(Claim)`: Our claim at the given position.
    /// - `Err(anyhow::Error)`: The trace is unavailable at the given position.
    async fn get(&self, position: u128) -> Result<Claim>;

    /// Fetch the [StepData] required to execute the single instruction that produces the state
    /// committed to by a leaf position.
    ///
    /// ### Takes
    /// - `position`: The leaf position whose post-state the step proves.
    ///
    /// ### Returns
    /// - `Ok(StepData)`: The pre-state, proof and oracle data for the step.
    /// - `Err(anyhow::Error)`: The trace is unavailable at the given position.
    async fn get_step_data(&self, position: u128) -> Result<StepData>;
}
