//! The `driver` module contains implementations of the [Driver] trait.

use crate::{
    AlphabetResourceCreator, Driver, DriverConfig, FaultDisputeGameContract, FaultResponder,
    GamePlayer, PlayerConfig, Responder,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::providers::Middleware;
use std::sync::Arc;

/// Defines a new [Driver] implementation.
#[macro_export]
macro_rules! define_driver {
    ($name:ident, $inner:expr) => {
        #[allow(dead_code)]
        #[doc = concat!("Variant of the [Driver] trait: [", stringify!($name), "]")]
        pub struct $name {
            /// The configuration for all of the drivers.
            pub config: Arc<DriverConfig>,
        }

        #[async_trait]
        impl Driver for $name {
            async fn start_loop(self) -> Result<()> {
                #[allow(clippy::redundant_closure_call)]
                $inner(self).await
            }
        }

        impl $name {
            #[doc = concat!("Creates a new instance of the [", stringify!($name), "] driver.")]
            pub fn new(config: Arc<DriverConfig>) -> Self {
                Self { config }
            }
        }
    };
}

define_driver!(
    TxDispatchDriver,
    (|self: TxDispatchDriver| {
        async move {
            tracing::info!(target: "tx-dispatch-driver", "Starting transaction dispatch driver...");
            let mut locked_receive_ch = self.config.tx_receiver.lock().await;
            tracing::info!(target: "tx-dispatch-driver", "Locked receive channel mutex successfully. Beginning tx dispatch loop.");

            loop {
                let request = tokio::select! {
                    biased;
                    _ = self.config.shutdown.cancelled() => break,
                    request = locked_receive_ch.recv() => request,
                };
                let Some(request) = request else {
                    break;
                };

                tracing::info!(target: "tx-dispatch-driver", "Transaction request received in dispatch driver. Sending transaction...");
                let result = match self.config.l1_provider.send_transaction(request.tx, None).await {
                    Ok(pending) => {
                        tracing::info!(target: "tx-dispatch-driver", "Transaction sent successfully. Tx hash: {:?}", pending.tx_hash());
                        pending
                            .await
                            .map_err(|e| anyhow!(e))
                            .and_then(|receipt| {
                                receipt.ok_or(anyhow!("Transaction dropped from the mempool"))
                            })
                    }
                    Err(e) => Err(anyhow!(e)),
                };
                if let Err(e) = &result {
                    // Soft failure, log the error and continue. The requester retries.
                    tracing::error!(target: "tx-dispatch-driver", "Error sending transaction: {}", e);
                }
                if request.reply.send(result).is_err() {
                    tracing::warn!(target: "tx-dispatch-driver", "Transaction requester went away before the receipt arrived");
                }
            }

            tracing::info!(target: "tx-dispatch-driver", "Transaction dispatch driver stopped.");
            Ok(())
        }
    })
);

define_driver!(
    GameDriver,
    (|self: GameDriver| {
        async move {
            let config = &self.config;
            let game = config.game_address;
            tracing::info!(target: "game-driver", "Loading game {:?}...", game);

            let loader = Arc::new(FaultDisputeGameContract::new(
                game,
                Arc::clone(&config.l1_provider),
            ));
            let mut creator = AlphabetResourceCreator::new(
                Arc::clone(&config.alphabet),
                Arc::clone(&config.trace_cache),
            );
            if let Some(oracle) = config.preimage_oracle {
                creator = creator.with_preimage_oracle(
                    oracle,
                    Arc::clone(&config.l1_provider),
                    config.tx_sender.clone(),
                );
            }
            let player_config = PlayerConfig::new(
                config.agree_with_proposed_output,
                config.l1_provider.address(),
                config.datadir.clone(),
            );

            let mut player = GamePlayer::try_new(game, loader, &player_config, &creator, |addr| {
                Ok(Arc::new(FaultResponder::new(
                    addr,
                    Arc::clone(&config.l1_provider),
                    config.tx_sender.clone(),
                )) as Arc<dyn Responder>)
            })
            .await?;

            let mut ticker = tokio::time::interval(config.poll_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = config.shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let status = player.progress_game(&config.shutdown).await;
                if status.is_terminal() {
                    tracing::info!(target: "game-driver", "Game {:?} resolved: {}", game, status);
                    break;
                }
            }

            Ok(())
        }
    })
);
