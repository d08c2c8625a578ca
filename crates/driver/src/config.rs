//! The `config` module contains the [DriverConfig].

use crate::{SignerMiddlewareWS, Shutdown, TraceCache, TxRequest};
use ethers::types::Address;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::{mpsc, Mutex};

/// The [DriverConfig] struct contains the configuration for the [Driver](crate::Driver) implementations.
pub struct DriverConfig {
    /// The provider used to read game state and send transactions on L1.
    pub l1_provider: Arc<SignerMiddlewareWS>,
    /// The address of the game to play.
    pub game_address: Address,
    /// Whether we agree with the root claim proposed by the game's creator.
    pub agree_with_proposed_output: bool,
    /// The directory per-game working directories are created in.
    pub datadir: PathBuf,
    /// The interval at which the game is progressed.
    pub poll_interval: Duration,
    /// The alphabet trace the game is played with.
    pub alphabet: Arc<[u8]>,
    /// The address of the preimage oracle, if steps must publish preimages.
    pub preimage_oracle: Option<Address>,
    /// The process-wide trace cache.
    pub trace_cache: Arc<TraceCache>,
    /// Signals the drivers to stop.
    pub shutdown: Shutdown,
    /// The sending handle of the MPSC channel used to send transactions.
    pub tx_sender: mpsc::Sender<TxRequest>,
    /// The receiving handle of the MPSC channel used to send transactions.
    pub tx_receiver: Mutex<mpsc::Receiver<TxRequest>>,
}

impl DriverConfig {
    /// Creates a new [DriverConfig] with the given configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        l1_provider: Arc<SignerMiddlewareWS>,
        game_address: Address,
        agree_with_proposed_output: bool,
        datadir: PathBuf,
        poll_interval: Duration,
        alphabet: Arc<[u8]>,
        preimage_oracle: Option<Address>,
        shutdown: Shutdown,
    ) -> Self {
        // Create a new MPSC channel for sending transactions from the drivers.
        let (tx_sender, tx_receiver) = mpsc::channel(128);

        Self {
            l1_provider,
            game_address,
            agree_with_proposed_output,
            datadir,
            poll_interval,
            alphabet,
            preimage_oracle,
            trace_cache: Arc::new(TraceCache::new()),
            shutdown,
            tx_sender,
            tx_receiver: Mutex::new(tx_receiver),
        }
    }
}
