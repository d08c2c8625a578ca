use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Middleware, Provider, Ws},
    signers::{LocalWallet, Signer},
    types::Address,
};
use fault_challenger_driver::{
    shutdown_channel, Driver, DriverConfig, GameDriver, TxDispatchDriver,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::Level;

/// Arguments for the `fault-challenger` binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count, env = "VERBOSITY")]
    v: u8,

    /// The Websocket RPC endpoint used to index and send transactions.
    #[arg(
        long,
        short,
        help = "The Websocket RPC endpoint used to index and send transactions.",
        env = "FAULT_CHALLENGER_WS"
    )]
    ws_endpoint: String,

    /// The private key used to sign transactions.
    #[arg(
        long,
        short,
        help = "The private key used to sign transactions.",
        env = "FAULT_CHALLENGER_KEY"
    )]
    private_key: String,

    /// The address of the fault dispute game to play.
    #[arg(
        long,
        short,
        help = "The address of the fault dispute game to play.",
        env = "FAULT_CHALLENGER_GAME"
    )]
    game_address: Address,

    /// Whether we agree with the root claim proposed by the game's creator.
    #[arg(
        long,
        help = "Agree with the root claim proposed by the game's creator.",
        env = "FAULT_CHALLENGER_AGREE_WITH_PROPOSED_OUTPUT"
    )]
    agree_with_proposed_output: bool,

    /// The directory per-game working directories are created in.
    #[arg(
        long,
        short,
        help = "The directory per-game working directories are created in.",
        env = "FAULT_CHALLENGER_DATADIR",
        default_value = "./challenger-data"
    )]
    datadir: PathBuf,

    /// The interval, in seconds, at which the game is progressed.
    #[arg(
        long,
        help = "The interval, in seconds, at which the game is progressed.",
        env = "FAULT_CHALLENGER_POLL_INTERVAL",
        default_value_t = 12
    )]
    poll_interval: u64,

    /// The alphabet trace the game is played with.
    #[arg(
        long,
        help = "The alphabet trace the game is played with.",
        env = "FAULT_CHALLENGER_ALPHABET"
    )]
    alphabet: String,

    /// The address of the preimage oracle contract.
    #[arg(
        long,
        help = "The address of the preimage oracle contract.",
        env = "FAULT_CHALLENGER_PREIMAGE_ORACLE"
    )]
    preimage_oracle: Option<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the command arguments
    let Args {
        v,
        ws_endpoint,
        private_key,
        game_address,
        agree_with_proposed_output,
        datadir,
        poll_interval,
        alphabet,
        preimage_oracle,
    } = Args::parse();

    // Initialize the tracing subscriber
    init_tracing_subscriber(v)?;

    if alphabet.is_empty() {
        return Err(anyhow!("The alphabet trace must not be empty"));
    }

    // Connect to the websocket endpoint and attach the signer.
    tracing::debug!(target: "fault-challenger-cli", "Connecting to websocket endpoint...");
    let provider = Provider::<Ws>::connect(ws_endpoint.clone()).await?;
    let chain_id = provider.get_chainid().await?;
    let wallet = private_key
        .parse::<LocalWallet>()?
        .with_chain_id(chain_id.as_u64());
    let l1_provider = Arc::new(SignerMiddleware::new(provider, wallet));
    tracing::info!(target: "fault-challenger-cli", "Websocket connected @ {}, acting as {:?}", &ws_endpoint, l1_provider.address());

    // Create the driver config.
    let (shutdown_handle, shutdown) = shutdown_channel();
    let driver_config = Arc::new(DriverConfig::new(
        l1_provider,
        game_address,
        agree_with_proposed_output,
        datadir,
        Duration::from_secs(poll_interval),
        alphabet.into_bytes().into(),
        preimage_oracle,
        shutdown,
    ));
    tracing::info!(target: "fault-challenger-cli", "Driver config created successfully.");

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "fault-challenger-cli", "Received interrupt, shutting down...");
            shutdown_handle.trigger();
        }
    });

    // Start the driver loops. The dispatch driver stops once the game driver finishes.
    let dispatch = TxDispatchDriver::new(Arc::clone(&driver_config));
    let game = GameDriver::new(driver_config);
    tokio::select! {
        res = dispatch.start_loop() => res?,
        res = game.start_loop() => res?,
    }

    Ok(())
}

/// Initializes the tracing subscriber
///
/// # Arguments
/// * `verbosity_level` - The verbosity level (0-4)
///
/// # Returns
/// * `Result<()>` - Ok if successful, Err otherwise.
fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
