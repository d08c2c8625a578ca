//! The agent module holds the [Agent], which submits the responses the [Solver] computes.

use crate::{GameLoader, OracleUpdater, Responder};
use anyhow::{anyhow, Result};
use fault_challenger_solvers::fault::{ClaimTree, Response, Solver, TraceAccessor};
use std::{collections::HashSet, sync::Arc};

/// The [Agent] plays one game. Every call to [Agent::act] rebuilds the [ClaimTree] from the
/// loader and responds to every claim that needs it.
pub struct Agent {
    /// Computes our responses.
    solver: Solver,
    /// The maximum depth of the game.
    max_depth: u64,
    /// Reads the game's claims.
    loader: Arc<dyn GameLoader>,
    /// Our trace.
    trace: Arc<dyn TraceAccessor>,
    /// Publishes the oracle data steps depend on.
    updater: Arc<dyn OracleUpdater>,
    /// Submits our moves.
    responder: Arc<dyn Responder>,
    /// Indices of the claims we have successfully countered.
    countered: HashSet<usize>,
}

impl Agent {
    /// Creates a new [Agent].
    pub fn new(
        solver: Solver,
        max_depth: u64,
        loader: Arc<dyn GameLoader>,
        trace: Arc<dyn TraceAccessor>,
        updater: Arc<dyn OracleUpdater>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            solver,
            max_depth,
            loader,
            trace,
            updater,
            responder,
            countered: HashSet::new(),
        }
    }

    /// Returns the indices of the claims we have countered.
    pub fn countered(&self) -> &HashSet<usize> {
        &self.countered
    }

    /// Performs every response the current state of the game requires. A failure to respond to
    /// one claim does not prevent responses to the others; the failed claim is retried on the
    /// next call.
    pub async fn act(&mut self) -> Result<()> {
        let claims = self.loader.get_claims().await?;
        let tree = ClaimTree::new(claims, self.max_depth)?;
        tracing::trace!(
            target: "agent",
            tree = %serde_json::to_string(&tree).unwrap_or_default(),
            "Loaded claim tree"
        );

        let responses = self
            .solver
            .calculate_responses(&tree, self.trace.as_ref(), &self.countered)
            .await;

        let total = responses.len();
        let mut failures = 0;
        for (index, response) in responses {
            let result = match response {
                Ok(response) => self.perform(response).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    self.countered.insert(index);
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(target: "agent", claim = index, "Failed to respond to claim: {:?}", e);
                }
            }
        }

        if failures > 0 {
            return Err(anyhow!("{} of {} responses failed", failures, total));
        }
        Ok(())
    }

    /// Submits a single [Response].
    async fn perform(&self, response: Response) -> Result<()> {
        match response {
            Response::Move {
                parent_index,
                is_attack: true,
                position,
                claim,
            } => {
                tracing::info!(target: "agent", parent_index, position, "Attacking claim");
                self.responder.attack(parent_index, position, claim).await
            }
            Response::Move {
                parent_index,
                is_attack: false,
                position,
                claim,
            } => {
                tracing::info!(target: "agent", parent_index, position, "Defending claim");
                self.responder.defend(parent_index, position, claim).await
            }
            Response::Step {
                parent_index,
                position,
                is_attack,
                step_data,
            } => {
                // The step executes the instruction producing the leaf's state when attacking,
                // and the one after it when defending.
                let oracle_position = if is_attack { position } else { position + 1 };
                self.updater.publish(oracle_position).await?;

                tracing::info!(target: "agent", parent_index, position, is_attack, "Stepping");
                self.responder
                    .step(parent_index, position, is_attack, &step_data)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::Agent;
    use crate::test_utils::{FakeGame, Move, AGENT, MAX_DEPTH, TRACE};
    use fault_challenger_solvers::fault::{AlphabetTraceProvider, Solver, TraceAccessor};
    use std::sync::Arc;

    fn agent(game: &Arc<FakeGame>, agree: bool) -> Agent {
        Agent::new(
            Solver::new(MAX_DEPTH, agree, AGENT),
            MAX_DEPTH,
            game.clone(),
            Arc::new(AlphabetTraceProvider::new(TRACE, MAX_DEPTH).unwrap()),
            game.clone(),
            game.clone(),
        )
    }

    #[tokio::test]
    async fn attacks_dishonest_root() {
        let game = Arc::new(FakeGame::with_dishonest_root().await);
        let mut agent = agent(&game, true);
        agent.act().await.unwrap();

        let honest = AlphabetTraceProvider::new(TRACE, MAX_DEPTH).unwrap();
        assert_eq!(
            game.moves(),
            vec![Move::Attack {
                parent_index: 0,
                position: 2,
                claim: honest.get(2).await.unwrap(),
            }]
        );
    }

    #[tokio::test]
    async fn second_act_on_unchanged_tree_is_idempotent() {
        let game = Arc::new(FakeGame::with_dishonest_root().await);
        game.set_land_moves(false);
        let mut agent = agent(&game, true);

        agent.act().await.unwrap();
        agent.act().await.unwrap();
        assert_eq!(game.moves().len(), 1);
    }

    #[tokio::test]
    async fn landed_moves_are_not_repeated() {
        let game = Arc::new(FakeGame::with_dishonest_root().await);
        let mut first = agent(&game, true);

        first.act().await.unwrap();
        assert_eq!(game.claim_count(), 2);

        // A fresh agent sees its own counter in the tree and does not repeat it.
        let mut restarted = agent(&game, true);
        restarted.act().await.unwrap();
        assert_eq!(game.moves().len(), 1);
    }

    #[tokio::test]
    async fn failed_submissions_are_retried() {
        let game = Arc::new(FakeGame::with_dishonest_root().await);
        game.set_fail_moves(true);
        let mut agent = agent(&game, true);

        assert!(agent.act().await.is_err());
        assert!(game.moves().is_empty());
        assert!(agent.countered().is_empty());

        game.set_fail_moves(false);
        agent.act().await.unwrap();
        assert_eq!(game.moves().len(), 1);
        assert!(agent.countered().contains(&0));
    }

    #[tokio::test]
    async fn publishes_oracle_data_before_leaf_step() {
        let game = Arc::new(FakeGame::with_dishonest_leaf().await);
        let mut agent = agent(&game, true);
        agent.act().await.unwrap();

        let moves = game.moves();
        assert_eq!(game.published(), vec![16]);
        assert_eq!(
            moves.last(),
            Some(&Move::Step {
                parent_index: 4,
                position: 16,
                is_attack: true,
            })
        );
        assert!(game.published_before_step());
    }

    #[tokio::test]
    async fn oracle_failure_blocks_only_that_step() {
        let game = Arc::new(FakeGame::with_dishonest_leaf().await);
        game.set_fail_publish(true);
        let mut agent = agent(&game, true);

        assert!(agent.act().await.is_err());
        assert!(!game
            .moves()
            .iter()
            .any(|m| matches!(m, Move::Step { .. })));
    }
}
