//! In-memory fakes of the on-chain collaborators, used by the unit tests.

use crate::{
    AbsolutePrestateValidator, CachingTraceAccessor, GameLoader, GameResources, OracleUpdater,
    ResourceCreator, Responder, TraceCache,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::types::{Address, H160, H256};
use fault_challenger_solvers::fault::{
    AlphabetTraceProvider, Claim, ClaimData, GameStatus, StepData, TraceAccessor,
};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// The address of the game under test.
pub(crate) const GAME: Address = H160([0x9a; 20]);
/// The address the agent plays from.
pub(crate) const AGENT: Address = H160([0x11; 20]);
/// The address of the opposing participant.
pub(crate) const OPPONENT: Address = H160([0x22; 20]);
/// The maximum depth of the game under test.
pub(crate) const MAX_DEPTH: u64 = 4;
/// The honest trace.
pub(crate) const TRACE: &[u8] = b"abcdefghijklmnop";
/// A trace that diverges from [TRACE] after its fifth instruction.
pub(crate) const DISHONEST_TRACE: &[u8] = b"abcdexyzxyzxyzxy";

/// A move recorded by the [FakeGame].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Move {
    Attack {
        parent_index: usize,
        position: u128,
        claim: Claim,
    },
    Defend {
        parent_index: usize,
        position: u128,
        claim: Claim,
    },
    Step {
        parent_index: usize,
        position: u128,
        is_attack: bool,
    },
}

#[derive(Debug)]
struct State {
    status: GameStatus,
    max_depth: u64,
    claims: Vec<ClaimData>,
    prestate: Claim,
    moves: Vec<Move>,
    published: Vec<u128>,
    events: Vec<&'static str>,
    land_moves: bool,
    fail_moves: bool,
    fail_publish: bool,
    fail_status: bool,
    fail_claim_count: bool,
}

/// A single game held in memory. It serves as the [GameLoader], [Responder] and
/// [OracleUpdater]; accepted moves are appended to the claim list as the contract would.
#[derive(Debug)]
pub(crate) struct FakeGame {
    state: Mutex<State>,
    status_reads: AtomicUsize,
    claim_reads: AtomicUsize,
}

impl FakeGame {
    pub(crate) fn new(claims: Vec<ClaimData>) -> Self {
        let prestate = AlphabetTraceProvider::new(TRACE, MAX_DEPTH)
            .unwrap()
            .absolute_prestate();
        Self {
            state: Mutex::new(State {
                status: GameStatus::InProgress,
                max_depth: MAX_DEPTH,
                claims,
                prestate,
                moves: Vec::new(),
                published: Vec::new(),
                events: Vec::new(),
                land_moves: true,
                fail_moves: false,
                fail_publish: false,
                fail_status: false,
                fail_claim_count: false,
            }),
            status_reads: AtomicUsize::new(0),
            claim_reads: AtomicUsize::new(0),
        }
    }

    /// A game whose only claim is a dishonest root made by the opponent.
    pub(crate) async fn with_dishonest_root() -> Self {
        let dishonest = AlphabetTraceProvider::new(DISHONEST_TRACE, MAX_DEPTH).unwrap();
        Self::new(vec![claim(0, None, 1, dishonest.get(1).await.unwrap(), OPPONENT)])
    }

    /// A game bisected down to a dishonest leaf at position 16, with every other opposing claim
    /// already countered by the agent.
    pub(crate) async fn with_dishonest_leaf() -> Self {
        let honest = AlphabetTraceProvider::new(TRACE, MAX_DEPTH).unwrap();
        let dishonest = AlphabetTraceProvider::new(DISHONEST_TRACE, MAX_DEPTH).unwrap();
        Self::new(vec![
            claim(0, None, 1, dishonest.get(1).await.unwrap(), OPPONENT),
            claim(1, Some(0), 2, honest.get(2).await.unwrap(), AGENT),
            claim(2, Some(1), 4, dishonest.get(4).await.unwrap(), OPPONENT),
            claim(3, Some(2), 8, honest.get(8).await.unwrap(), AGENT),
            claim(4, Some(3), 16, H256::repeat_byte(0xee), OPPONENT),
        ])
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn set_status(&self, status: GameStatus) {
        self.state().status = status;
    }

    pub(crate) fn set_max_depth(&self, max_depth: u64) {
        self.state().max_depth = max_depth;
    }

    pub(crate) fn set_prestate(&self, prestate: Claim) {
        self.state().prestate = prestate;
    }

    pub(crate) fn set_land_moves(&self, land: bool) {
        self.state().land_moves = land;
    }

    pub(crate) fn set_fail_moves(&self, fail: bool) {
        self.state().fail_moves = fail;
    }

    pub(crate) fn set_fail_publish(&self, fail: bool) {
        self.state().fail_publish = fail;
    }

    pub(crate) fn set_fail_status(&self, fail: bool) {
        self.state().fail_status = fail;
    }

    pub(crate) fn set_fail_claim_count(&self, fail: bool) {
        self.state().fail_claim_count = fail;
    }

    pub(crate) fn moves(&self) -> Vec<Move> {
        self.state().moves.clone()
    }

    pub(crate) fn published(&self) -> Vec<u128> {
        self.state().published.clone()
    }

    pub(crate) fn claim_count(&self) -> usize {
        self.state().claims.len()
    }

    pub(crate) fn status_reads(&self) -> usize {
        self.status_reads.load(Ordering::SeqCst)
    }

    pub(crate) fn claim_reads(&self) -> usize {
        self.claim_reads.load(Ordering::SeqCst)
    }

    /// Returns `true` if oracle data was published before the first step was submitted.
    pub(crate) fn published_before_step(&self) -> bool {
        let state = self.state();
        let publish = state.events.iter().position(|e| *e == "publish");
        let step = state.events.iter().position(|e| *e == "step");
        matches!((publish, step), (Some(p), Some(s)) if p < s)
    }

    fn record(&self, mv: Move, landed: Option<(usize, u128, Claim)>) -> Result<()> {
        let mut state = self.state();
        if state.fail_moves {
            return Err(anyhow!("transaction reverted"));
        }
        state.events.push(match mv {
            Move::Step { .. } => "step",
            _ => "move",
        });
        if state.land_moves {
            match landed {
                Some((parent_index, position, value)) => {
                    let index = state.claims.len();
                    state.claims[parent_index].countered = true;
                    state
                        .claims
                        .push(claim(index, Some(parent_index), position, value, AGENT));
                }
                None => state.claims[mv_parent(&mv)].countered = true,
            }
        }
        state.moves.push(mv);
        Ok(())
    }
}

fn mv_parent(mv: &Move) -> usize {
    match mv {
        Move::Attack { parent_index, .. }
        | Move::Defend { parent_index, .. }
        | Move::Step { parent_index, .. } => *parent_index,
    }
}

pub(crate) fn claim(
    contract_index: usize,
    parent_index: Option<usize>,
    position: u128,
    claim: Claim,
    claimant: Address,
) -> ClaimData {
    ClaimData {
        contract_index,
        parent_index,
        countered: false,
        claimant,
        claim,
        position,
    }
}

#[async_trait]
impl GameLoader for FakeGame {
    async fn get_status(&self) -> Result<GameStatus> {
        self.status_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.fail_status {
            return Err(anyhow!("status unavailable"));
        }
        Ok(state.status)
    }

    async fn get_claim_count(&self) -> Result<u64> {
        let state = self.state();
        if state.fail_claim_count {
            return Err(anyhow!("claim count unavailable"));
        }
        Ok(state.claims.len() as u64)
    }

    async fn get_max_game_depth(&self) -> Result<u64> {
        Ok(self.state().max_depth)
    }

    async fn get_claims(&self) -> Result<Vec<ClaimData>> {
        self.claim_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().claims.clone())
    }

    async fn get_absolute_prestate(&self) -> Result<Claim> {
        Ok(self.state().prestate)
    }
}

#[async_trait]
impl Responder for FakeGame {
    async fn attack(&self, parent_index: usize, position: u128, claim: Claim) -> Result<()> {
        self.record(
            Move::Attack {
                parent_index,
                position,
                claim,
            },
            Some((parent_index, position, claim)),
        )
    }

    async fn defend(&self, parent_index: usize, position: u128, claim: Claim) -> Result<()> {
        self.record(
            Move::Defend {
                parent_index,
                position,
                claim,
            },
            Some((parent_index, position, claim)),
        )
    }

    async fn step(
        &self,
        parent_index: usize,
        position: u128,
        is_attack: bool,
        _: &StepData,
    ) -> Result<()> {
        self.record(
            Move::Step {
                parent_index,
                position,
                is_attack,
            },
            None,
        )
    }
}

#[async_trait]
impl OracleUpdater for FakeGame {
    async fn publish(&self, position: u128) -> Result<()> {
        let mut state = self.state();
        if state.fail_publish {
            return Err(anyhow!("preimage oracle unavailable"));
        }
        state.published.push(position);
        state.events.push("publish");
        Ok(())
    }
}

/// A [ResourceCreator] serving the honest alphabet trace through a [TraceCache], with the
/// [FakeGame] as oracle updater.
pub(crate) struct FakeCreator {
    game: Arc<FakeGame>,
    cache: Arc<TraceCache>,
    calls: AtomicUsize,
}

impl FakeCreator {
    pub(crate) fn new(game: Arc<FakeGame>) -> Self {
        Self {
            game,
            cache: Arc::new(TraceCache::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cache(&self) -> &TraceCache {
        &self.cache
    }
}

#[async_trait]
impl ResourceCreator for FakeCreator {
    async fn create(&self, _: Address, max_depth: u64, _: &Path) -> Result<GameResources> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let provider = AlphabetTraceProvider::new(TRACE, max_depth)?;
        Ok(GameResources {
            validator: Box::new(AbsolutePrestateValidator::new(provider.absolute_prestate())),
            trace: Arc::new(CachingTraceAccessor::new(
                GAME,
                Arc::new(provider),
                Arc::clone(&self.cache),
            )),
            updater: self.game.clone(),
            cache: Some(Arc::clone(&self.cache)),
        })
    }
}
