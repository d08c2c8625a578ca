#![doc = include_str!("../README.md")]

use anyhow::Result;
use async_trait::async_trait;

/// Contains the smart contract bindings used by the driver.
mod bindings;

mod types;
pub use types::{submit, SignerMiddlewareWS, TxRequest};

mod config;
pub use config::DriverConfig;

mod shutdown;
pub use shutdown::{shutdown_channel, Shutdown, ShutdownHandle};

mod loader;
pub use loader::{FaultDisputeGameContract, GameLoader};

mod responder;
pub use responder::{FaultResponder, Responder};

mod oracle;
pub use oracle::{ContractOracleUpdater, NoopOracleUpdater, OracleUpdater};

mod cache;
pub use cache::{CachingTraceAccessor, TraceCache};

mod resources;
pub use resources::{
    AbsolutePrestateValidator, AlphabetResourceCreator, GameResources, PrestateValidator,
    ResourceCreator,
};

mod agent;
pub use agent::Agent;

mod player;
pub use player::{GameOutcome, GamePlayer, PlayerConfig};

mod drivers;
pub use drivers::{GameDriver, TxDispatchDriver};

#[cfg(test)]
mod test_utils;

/// The [Driver] trait defines the interface for all driver loops that are ran by the
/// `fault-challenger` binary.
#[async_trait]
pub trait Driver {
    /// Starts the [Driver] loop.
    async fn start_loop(self) -> Result<()>;
}
