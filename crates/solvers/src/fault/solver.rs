//! The solver module holds the [Solver], which decides how the agent responds to each claim in a
//! [ClaimTree] by recomputing the trace rather than trusting any claim.

use super::{ClaimData, ClaimTree, Position, Response, TraceAccessor};
use anyhow::{anyhow, Result};
use ethers::types::Address;
use std::collections::HashSet;

/// The [Solver] computes the set of responses the agent must make to keep its side of the game
/// consistent with the canonical trace.
#[derive(Debug, Clone)]
pub struct Solver {
    /// The maximum depth of the game.
    max_depth: u64,
    /// Whether the agent agrees with the root claim proposed by the game's creator.
    agree_with_proposed_output: bool,
    /// The address the agent submits moves from.
    agent: Address,
}

impl Solver {
    /// Creates a new [Solver].
    pub fn new(max_depth: u64, agree_with_proposed_output: bool, agent: Address) -> Self {
        Self {
            max_depth,
            agree_with_proposed_output,
            agent,
        }
    }

    /// Returns `true` if claims at the given claim's depth belong to the opposing team. The team
    /// that agrees with the root claim owns the even depths, so an agent that agrees with the
    /// proposed output is on the challenging side and answers the root.
    pub fn responds_to_level(&self, claim: &ClaimData) -> bool {
        let is_odd = claim.position.depth() % 2 == 1;
        is_odd != self.agree_with_proposed_output
    }

    /// Computes a response for every claim in the tree that needs one.
    ///
    /// ### Takes
    /// - `tree`: A fresh snapshot of the game's claims.
    /// - `trace`: Our trace.
    /// - `exclude`: Indices of claims the agent has already countered.
    ///
    /// ### Returns
    /// - One entry per claim that requires a response or whose response could not be computed.
    ///   Errors are isolated to the claim they occurred for.
    pub async fn calculate_responses(
        &self,
        tree: &ClaimTree,
        trace: &dyn TraceAccessor,
        exclude: &HashSet<usize>,
    ) -> Vec<(usize, Result<Response>)> {
        let mut responses = Vec::new();
        for claim in tree.claims() {
            let index = claim.contract_index;
            if exclude.contains(&index) {
                tracing::trace!(target: "solver", claim = index, "Claim already countered by us");
                continue;
            }
            match self.respond(tree, index, trace).await {
                Ok(Some(response)) => responses.push((index, Ok(response))),
                Ok(None) => {}
                Err(e) => responses.push((index, Err(e))),
            }
        }
        responses
    }

    /// Respond to a [ClaimData] made by a participant in the dispute game.
    ///
    /// ### Takes
    /// - `tree`: A fresh snapshot of the game's claims.
    /// - `index`: The index of the claim in the DAG array.
    /// - `trace`: Our trace.
    ///
    /// ### Returns
    /// - `Ok(Some(Response))`: The response to the claim.
    /// - `Ok(None)`: The claim does not require a response from us.
    /// - `Err(anyhow::Error)`: An error occurred while determining the correct response.
    pub async fn respond(
        &self,
        tree: &ClaimTree,
        index: usize,
        trace: &dyn TraceAccessor,
    ) -> Result<Option<Response>> {
        let claim = tree.get(index)?;

        if !self.responds_to_level(claim) {
            return Ok(None);
        }
        if tree.countered_by(index, self.agent) {
            tracing::trace!(target: "solver", claim = index, "Claim already countered by us");
            return Ok(None);
        }

        let ours = trace.get(claim.position).await?;
        let agree = ours == claim.claim;

        if claim.position.depth() == self.max_depth {
            if claim.countered {
                return Ok(None);
            }
            return self.step(claim, agree, trace).await.map(Some);
        }

        if agree {
            // Nothing remains to dispute below a claim we agree with once it has been countered,
            // and the root has no range to its right.
            if claim.is_root() || tree.children(index).next().is_some() {
                return Ok(None);
            }
            self.counter(tree, claim, false, trace).await
        } else {
            self.counter(tree, claim, true, trace).await
        }
    }

    /// Builds a bisection move against `claim`.
    async fn counter(
        &self,
        tree: &ClaimTree,
        claim: &ClaimData,
        is_attack: bool,
        trace: &dyn TraceAccessor,
    ) -> Result<Option<Response>> {
        let position = claim.position.make_move(is_attack);
        let value = trace.get(position).await?;

        if tree.contains(claim.contract_index, position, value) {
            tracing::trace!(target: "solver", claim = claim.contract_index, position, "Move already present in the game");
            return Ok(None);
        }

        tracing::debug!(
            target: "solver",
            claim = claim.contract_index,
            position,
            is_attack,
            "Countering claim"
        );
        Ok(Some(Response::Move {
            parent_index: claim.contract_index,
            is_attack,
            position,
            claim: value,
        }))
    }

    /// Builds a step against the leaf `claim`. An attack executes the instruction that produces
    /// the leaf's state; a defense executes the instruction that follows it.
    async fn step(
        &self,
        claim: &ClaimData,
        agree: bool,
        trace: &dyn TraceAccessor,
    ) -> Result<Response> {
        let is_attack = !agree;
        let step_position = if is_attack {
            claim.position
        } else {
            // The position after the final leaf is the first one a level deeper.
            if (claim.position + 1).depth() != self.max_depth {
                return Err(anyhow!(
                    "Cannot defend the final leaf at position {}",
                    claim.position
                ));
            }
            claim.position + 1
        };
        let step_data = trace.get_step_data(step_position).await?;

        tracing::debug!(
            target: "solver",
            claim = claim.contract_index,
            position = claim.position,
            is_attack,
            "Stepping against leaf claim"
        );
        Ok(Response::Step {
            parent_index: claim.contract_index,
            position: claim.position,
            is_attack,
            step_data,
        })
    }
}
