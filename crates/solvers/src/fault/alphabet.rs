//! The alphabet module contains an implementation of the [TraceAccessor] trait for the
//! alphabet trace, where each instruction advances the state to the next byte of a string.

use super::{Claim, Position, StepData, TraceAccessor, MAX_GAME_DEPTH};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::{
    abi::{self, Token},
    types::{Bytes, U256},
    utils::keccak256,
};
use std::sync::Arc;

/// The state byte that precedes the first byte of every alphabet trace.
pub const ALPHABET_PRESTATE: u8 = b'`';

/// A [TraceAccessor] over an in-memory alphabet trace.
#[derive(Debug, Clone)]
pub struct AlphabetTraceProvider {
    /// Our full execution trace.
    trace: Arc<[u8]>,
    /// The maximum depth of the game the trace is played in.
    max_depth: u64,
}

impl AlphabetTraceProvider {
    /// Creates a new [AlphabetTraceProvider]. Trace indices past the end of `trace` repeat its
    /// final state, padding the trace out to `2^max_depth` instructions.
    pub fn new(trace: impl Into<Arc<[u8]>>, max_depth: u64) -> Result<Self> {
        let trace = trace.into();
        if trace.is_empty() {
            return Err(anyhow!("Alphabet trace must not be empty"));
        }
        if max_depth > MAX_GAME_DEPTH {
            return Err(anyhow!("Unsupported alphabet game depth: {}", max_depth));
        }
        Ok(Self { trace, max_depth })
    }

    /// Returns the commitment to the absolute prestate of the trace.
    pub fn absolute_prestate(&self) -> Claim {
        Claim::from(keccak256(self.absolute_prestate_data()))
    }

    /// Returns the encoded absolute prestate.
    pub fn absolute_prestate_data(&self) -> Bytes {
        abi::encode(&[
            Token::Uint(U256::zero()),
            Token::Uint(U256::from(ALPHABET_PRESTATE)),
        ])
        .into()
    }

    /// Returns the state at the given trace index.
    pub fn state_at(&self, trace_index: u64) -> u8 {
        let last = self.trace.len() - 1;
        self.trace[(trace_index as usize).min(last)]
    }

    /// Encodes the state at the given trace index.
    fn encode_state(&self, trace_index: u64) -> Vec<u8> {
        abi::encode(&[
            Token::Uint(U256::from(trace_index)),
            Token::Uint(U256::from(self.state_at(trace_index))),
        ])
    }

    /// Computes the [Claim] at the given position.
    pub fn claim_at(&self, position: u128) -> Result<Claim> {
        if position == 0 || position.depth() > self.max_depth {
            return Err(anyhow!(
                "Position {} is outside of a tree of depth {}",
                position,
                self.max_depth
            ));
        }
        let trace_index = position.trace_index(self.max_depth);
        Ok(Claim::from(keccak256(self.encode_state(trace_index))))
    }
}

#[async_trait]
impl TraceAccessor for AlphabetTraceProvider {
    async fn get(&self, position: u128) -> Result<Claim> {
        self.claim_at(position)
    }

    async fn get_step_data(&self, position: u128) -> Result<StepData> {
        if position == 0 || position.depth() != self.max_depth {
            return Err(anyhow!(
                "Step data requested for non-leaf position {}",
                position
            ));
        }
        let trace_index = position.trace_index(self.max_depth);
        let pre_state = if trace_index == 0 {
            self.absolute_prestate_data()
        } else {
            self.encode_state(trace_index - 1).into()
        };
        Ok(StepData {
            pre_state,
            proof: Bytes::default(),
            oracle_data: None,
        })
    }
}
