//! The types module contains all of the types relevant to the fault dispute game.

use anyhow::anyhow;
use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The [Claim] type represents a claim on the execution trace at a given trace index that is
/// made by a participant in a dispute game.
pub type Claim = H256;

/// The [GameStatus] enum mirrors the on-chain status of a fault dispute game. Once a game leaves
/// [GameStatus::InProgress] it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameStatus {
    InProgress = 0,
    ChallengerWon = 1,
    DefenderWon = 2,
}

impl GameStatus {
    /// Returns `true` if the game has been resolved.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl TryFrom<u8> for GameStatus {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameStatus::InProgress),
            1 => Ok(GameStatus::ChallengerWon),
            2 => Ok(GameStatus::DefenderWon),
            _ => Err(anyhow!("Invalid game status: {}", value)),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "In Progress"),
            GameStatus::ChallengerWon => write!(f, "Challenger Won"),
            GameStatus::DefenderWon => write!(f, "Defender Won"),
        }
    }
}

/// The [ClaimData] struct represents a [Claim] as well as the data associated with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimData {
    /// The index of the claim in the on-chain claim array.
    pub contract_index: usize,
    /// The index of the parent claim in the DAG array. `None` for the root claim.
    pub parent_index: Option<usize>,
    /// Whether or not the current claim has ever been countered.
    pub countered: bool,
    /// The address of the participant that made the claim.
    pub claimant: Address,
    /// The claim that is being made at the trace index relative to the position.
    pub claim: Claim,
    /// The position of the claim within the game tree.
    pub position: u128,
}

impl ClaimData {
    /// Returns `true` if the claim is the root claim of the game.
    pub fn is_root(&self) -> bool {
        self.parent_index.is_none()
    }
}

/// The [OracleData] struct holds a preimage that must be available in the preimage oracle before
/// a step that reads it can be executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleData {
    /// The preimage key.
    pub key: H256,
    /// The preimage itself.
    pub data: Bytes,
    /// The offset into the preimage that the step reads from.
    pub offset: u32,
}

/// The [StepData] struct contains the inputs required to execute a single instruction against a
/// leaf claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepData {
    /// The pre-state the instruction is executed from.
    pub pre_state: Bytes,
    /// The proof accompanying the pre-state.
    pub proof: Bytes,
    /// Preimage data read by the instruction, if any.
    pub oracle_data: Option<OracleData>,
}

/// A [Response] is an action taken by a participant in the dispute game in response to
/// a claim made by another participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Create a counter claim against the parent claim.
    Move {
        /// The index of the claim being countered.
        parent_index: usize,
        /// `true` for an attack, `false` for a defense.
        is_attack: bool,
        /// The position of the new claim.
        position: u128,
        /// Our claim at `position`.
        claim: Claim,
    },
    /// Perform a VM step against the parent claim.
    Step {
        /// The index of the leaf claim being stepped against.
        parent_index: usize,
        /// The position of the leaf claim.
        position: u128,
        /// `true` for an attack step, `false` for a defense step.
        is_attack: bool,
        /// The inputs for the step.
        step_data: StepData,
    },
}

impl Response {
    /// Returns the index of the claim that the [Response] counters.
    pub fn parent_index(&self) -> usize {
        match self {
            Response::Move { parent_index, .. } | Response::Step { parent_index, .. } => {
                *parent_index
            }
        }
    }
}
