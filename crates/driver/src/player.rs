//! The player module holds the [GamePlayer], which owns the lifecycle of a single game.

use crate::{Agent, GameLoader, ResourceCreator, Responder, Shutdown, TraceCache};
use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use fault_challenger_solvers::fault::{GameStatus, Solver, MAX_GAME_DEPTH};
use std::{path::PathBuf, sync::Arc};

/// The [PlayerConfig] struct contains the per-game settings for a [GamePlayer].
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Whether we agree with the root claim proposed by the game's creator.
    pub agree_with_proposed_output: bool,
    /// The address our moves are submitted from.
    pub agent: Address,
    /// The directory per-game working directories are created in.
    pub datadir: PathBuf,
}

impl PlayerConfig {
    /// Creates a new [PlayerConfig].
    pub fn new(agree_with_proposed_output: bool, agent: Address, datadir: PathBuf) -> Self {
        Self {
            agree_with_proposed_output,
            agent,
            datadir,
        }
    }

    /// Returns the working directory for the game at `game`.
    pub fn game_dir(&self, game: Address) -> PathBuf {
        self.datadir.join(format!("game-{:?}", game))
    }
}

/// The result of a resolved game from our point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
}

/// The [GamePlayer] drives a single game from discovery to resolution. It performs no scheduling
/// of its own; the caller invokes [GamePlayer::progress_game] repeatedly.
pub struct GamePlayer {
    /// The address of the game.
    game: Address,
    /// The agent playing the game. `None` if the game was already resolved when the player was
    /// created.
    agent: Option<Agent>,
    /// Whether we agree with the root claim proposed by the game's creator.
    agree_with_proposed_output: bool,
    /// Reads the game's state.
    loader: Arc<dyn GameLoader>,
    /// The shared trace cache, evicted for this game once it resolves.
    cache: Option<Arc<TraceCache>>,
    /// The last status read from the game.
    status: GameStatus,
    /// Our outcome, once the game is resolved.
    outcome: Option<GameOutcome>,
}

impl GamePlayer {
    /// Creates a new [GamePlayer] for the game at `game`.
    ///
    /// ### Takes
    /// - `game`: The address of the game.
    /// - `loader`: Reads the game's state.
    /// - `config`: The player settings.
    /// - `creator`: Builds the trace, oracle and prestate resources. Only invoked for games in
    ///   progress.
    /// - `new_responder`: Builds the [Responder] for the game. Only invoked for games in
    ///   progress.
    ///
    /// ### Returns
    /// - `Ok(GamePlayer)`: The player.
    /// - `Err(anyhow::Error)`: The game cannot be played safely.
    pub async fn try_new<F>(
        game: Address,
        loader: Arc<dyn GameLoader>,
        config: &PlayerConfig,
        creator: &dyn ResourceCreator,
        new_responder: F,
    ) -> Result<Self>
    where
        F: FnOnce(Address) -> Result<Arc<dyn Responder>>,
    {
        let status = loader
            .get_status()
            .await
            .context("failed to fetch game status")?;

        if status.is_terminal() {
            tracing::info!(target: "game-player", game = ?game, %status, "Game already resolved");
            return Ok(Self {
                game,
                agent: None,
                agree_with_proposed_output: config.agree_with_proposed_output,
                loader,
                cache: None,
                status,
                outcome: None,
            });
        }

        let max_depth = loader
            .get_max_game_depth()
            .await
            .context("failed to fetch the game depth")?;
        if max_depth > MAX_GAME_DEPTH {
            return Err(anyhow!(
                "Unsupported game depth {}, the maximum is {}",
                max_depth,
                MAX_GAME_DEPTH
            ));
        }

        let resources = creator
            .create(game, max_depth, &config.game_dir(game))
            .await
            .context("failed to create trace provider")?;

        resources
            .validator
            .validate(loader.as_ref())
            .await
            .context("failed to validate absolute prestate")?;

        let responder = new_responder(game).context("failed to create the responder")?;

        let agent = Agent::new(
            Solver::new(max_depth, config.agree_with_proposed_output, config.agent),
            max_depth,
            Arc::clone(&loader),
            resources.trace,
            resources.updater,
            responder,
        );

        tracing::info!(target: "game-player", game = ?game, max_depth, "Playing game");
        Ok(Self {
            game,
            agent: Some(agent),
            agree_with_proposed_output: config.agree_with_proposed_output,
            loader,
            cache: resources.cache,
            status,
            outcome: None,
        })
    }

    /// Returns the address of the game.
    pub fn game(&self) -> Address {
        self.game
    }

    /// Returns the last known [GameStatus].
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns our [GameOutcome], if the game was resolved while we were playing it.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Performs any moves the game requires and refreshes its status. Errors are logged, never
    /// returned; the next call retries. If `shutdown` is signalled the call returns the last
    /// known status without updating it.
    pub async fn progress_game(&mut self, shutdown: &Shutdown) -> GameStatus {
        if self.status.is_terminal() {
            tracing::trace!(target: "game-player", game = ?self.game, "Skipping completed game");
            return self.status;
        }

        let progressed = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            status = self.act_and_refresh() => Some(status),
        };
        match progressed {
            Some(status) => status,
            None => {
                tracing::debug!(target: "game-player", game = ?self.game, "Progress cancelled");
                self.status
            }
        }
    }

    /// Acts on the game, then reads its status.
    async fn act_and_refresh(&mut self) -> GameStatus {
        tracing::trace!(target: "game-player", game = ?self.game, "Checking if actions are required");
        if let Some(agent) = self.agent.as_mut() {
            if let Err(e) = agent.act().await {
                tracing::error!(target: "game-player", game = ?self.game, "Error when acting on game: {:?}", e);
            }
        }

        let status = match self.loader.get_status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(target: "game-player", game = ?self.game, "Unable to retrieve game status: {:?}", e);
                return GameStatus::InProgress;
            }
        };
        if status.is_terminal() {
            if let Some(cache) = &self.cache {
                cache.evict(self.game).await;
            }
        }
        self.log_game_status(status).await;
        self.status = status;
        status
    }

    /// Reports the claim count of a game in progress, or records our outcome once resolved.
    async fn log_game_status(&mut self, status: GameStatus) {
        if !status.is_terminal() {
            match self.loader.get_claim_count().await {
                Ok(claims) => {
                    tracing::info!(target: "game-player", game = ?self.game, claims, %status, "Game info")
                }
                Err(e) => {
                    tracing::warn!(target: "game-player", game = ?self.game, "Failed to get claim count for in progress game: {:?}", e)
                }
            }
            return;
        }

        let expected = if self.agree_with_proposed_output {
            GameStatus::ChallengerWon
        } else {
            GameStatus::DefenderWon
        };
        if status == expected {
            tracing::info!(target: "game-player", game = ?self.game, %status, "Game won");
            self.outcome = Some(GameOutcome::Won);
        } else {
            tracing::error!(target: "game-player", game = ?self.game, %status, "Game lost");
            self.outcome = Some(GameOutcome::Lost);
        }
    }
}
