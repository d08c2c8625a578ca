//! The resources module holds the [ResourceCreator] trait, which builds the per-game trace,
//! oracle and prestate capabilities once a game is known to be in progress.

use crate::{
    CachingTraceAccessor, ContractOracleUpdater, GameLoader, NoopOracleUpdater, OracleUpdater,
    SignerMiddlewareWS, TraceCache, TxRequest,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::types::Address;
use fault_challenger_solvers::fault::{AlphabetTraceProvider, Claim, TraceAccessor};
use std::{path::Path, sync::Arc};
use tokio::sync::mpsc;

/// The [PrestateValidator] trait checks that the absolute prestate a game was created with
/// matches our own trace. Playing a game with a mismatched prestate is unsafe.
#[async_trait]
pub trait PrestateValidator: Send + Sync {
    /// Validate the game's absolute prestate.
    async fn validate(&self, loader: &dyn GameLoader) -> Result<()>;
}

/// A [PrestateValidator] that compares the game's prestate against a known commitment.
#[derive(Debug, Clone, Copy)]
pub struct AbsolutePrestateValidator {
    /// Our absolute prestate.
    expected: Claim,
}

impl AbsolutePrestateValidator {
    /// Creates a new [AbsolutePrestateValidator].
    pub fn new(expected: Claim) -> Self {
        Self { expected }
    }
}

#[async_trait]
impl PrestateValidator for AbsolutePrestateValidator {
    async fn validate(&self, loader: &dyn GameLoader) -> Result<()> {
        let onchain = loader
            .get_absolute_prestate()
            .await
            .context("failed to fetch the absolute prestate")?;
        if onchain != self.expected {
            return Err(anyhow!(
                "Absolute prestate mismatch: game has {:?}, trace has {:?}",
                onchain,
                self.expected
            ));
        }
        Ok(())
    }
}

/// The capabilities required to play a single game.
pub struct GameResources {
    /// Our trace for the game.
    pub trace: Arc<dyn TraceAccessor>,
    /// Publishes the oracle data steps depend on.
    pub updater: Arc<dyn OracleUpdater>,
    /// Validates the game's absolute prestate.
    pub validator: Box<dyn PrestateValidator>,
    /// The shared cache `trace` reads through, if any. The game's entries are evicted once it
    /// resolves.
    pub cache: Option<Arc<TraceCache>>,
}

/// The [ResourceCreator] trait builds the [GameResources] for a game.
#[async_trait]
pub trait ResourceCreator: Send + Sync {
    /// Create the resources for the game at `game`.
    ///
    /// ### Takes
    /// - `game`: The address of the game.
    /// - `max_depth`: The maximum depth of the game.
    /// - `dir`: A working directory for local trace computation.
    async fn create(&self, game: Address, max_depth: u64, dir: &Path) -> Result<GameResources>;
}

/// The [AlphabetResourceCreator] plays games with the alphabet trace.
pub struct AlphabetResourceCreator {
    /// The alphabet trace.
    trace: Arc<[u8]>,
    /// The process-wide trace cache.
    cache: Arc<TraceCache>,
    /// The preimage oracle to publish to, along with the provider and dispatch channel.
    preimage_oracle: Option<(Address, Arc<SignerMiddlewareWS>, mpsc::Sender<TxRequest>)>,
}

impl AlphabetResourceCreator {
    /// Creates a new [AlphabetResourceCreator].
    pub fn new(trace: impl Into<Arc<[u8]>>, cache: Arc<TraceCache>) -> Self {
        Self {
            trace: trace.into(),
            cache,
            preimage_oracle: None,
        }
    }

    /// Publishes step preimages to the `PreimageOracle` at `address`.
    pub fn with_preimage_oracle(
        mut self,
        address: Address,
        provider: Arc<SignerMiddlewareWS>,
        tx_sender: mpsc::Sender<TxRequest>,
    ) -> Self {
        self.preimage_oracle = Some((address, provider, tx_sender));
        self
    }
}

#[async_trait]
impl ResourceCreator for AlphabetResourceCreator {
    async fn create(&self, game: Address, max_depth: u64, dir: &Path) -> Result<GameResources> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create working directory {}", dir.display()))?;

        let provider = AlphabetTraceProvider::new(Arc::clone(&self.trace), max_depth)?;
        let validator = AbsolutePrestateValidator::new(provider.absolute_prestate());
        let trace: Arc<dyn TraceAccessor> = Arc::new(CachingTraceAccessor::new(
            game,
            Arc::new(provider),
            Arc::clone(&self.cache),
        ));

        let updater: Arc<dyn OracleUpdater> = match &self.preimage_oracle {
            Some((address, l1_provider, tx_sender)) => Arc::new(ContractOracleUpdater::new(
                *address,
                Arc::clone(l1_provider),
                Arc::clone(&trace),
                tx_sender.clone(),
            )),
            None => Arc::new(NoopOracleUpdater),
        };

        Ok(GameResources {
            trace,
            updater,
            validator: Box::new(validator),
            cache: Some(Arc::clone(&self.cache)),
        })
    }
}
