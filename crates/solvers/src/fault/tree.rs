//! The tree module holds the [ClaimTree], the in-memory view of a game's claim DAG.

use super::{Claim, ClaimData, Position};
use anyhow::{anyhow, Result};
use ethers::types::Address;
use serde::Serialize;
use std::collections::HashMap;

/// The [ClaimTree] is rebuilt from the on-chain claim array every time the agent acts. The tree
/// owns every [ClaimData]; parent and child links are indices into the claim array, which is
/// ordered the same way as the contract's storage.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimTree {
    /// The maximum depth of the game.
    max_depth: u64,
    /// All claims, in ledger order.
    claims: Vec<ClaimData>,
    /// `children[i]` holds the indices of the claims whose parent is claim `i`.
    #[serde(skip)]
    children: Vec<Vec<usize>>,
    /// The indices of the claims at each position.
    #[serde(skip)]
    by_position: HashMap<u128, Vec<usize>>,
}

impl ClaimTree {
    /// Builds a [ClaimTree] from the ordered claim list of a game.
    ///
    /// ### Takes
    /// - `claims`: The claims of the game, in on-chain order.
    /// - `max_depth`: The maximum depth of the game.
    ///
    /// ### Returns
    /// - `Ok(ClaimTree)`: The validated tree.
    /// - `Err(anyhow::Error)`: The claim list violates a structural invariant of the game.
    pub fn new(mut claims: Vec<ClaimData>, max_depth: u64) -> Result<Self> {
        let mut children = vec![Vec::new(); claims.len()];
        let mut by_position: HashMap<u128, Vec<usize>> = HashMap::new();

        for index in 0..claims.len() {
            let claim = &claims[index];
            if claim.contract_index != index {
                return Err(anyhow!(
                    "Claim at offset {} has contract index {}",
                    index,
                    claim.contract_index
                ));
            }
            if claim.position == 0 || claim.position.depth() > max_depth {
                return Err(anyhow!(
                    "Claim {} has position {} outside of a tree of depth {}",
                    index,
                    claim.position,
                    max_depth
                ));
            }

            match claim.parent_index {
                None => {
                    if index != 0 || !claim.position.is_root() {
                        return Err(anyhow!("Claim {} is an unexpected root claim", index));
                    }
                }
                Some(parent_index) => {
                    if parent_index >= index {
                        return Err(anyhow!(
                            "Claim {} references parent {} which is not yet in the tree",
                            index,
                            parent_index
                        ));
                    }
                    let parent_depth = claims[parent_index].position.depth();
                    if claim.position.depth() != parent_depth + 1 {
                        return Err(anyhow!(
                            "Claim {} at depth {} does not descend from parent {} at depth {}",
                            index,
                            claim.position.depth(),
                            parent_index,
                            parent_depth
                        ));
                    }
                    children[parent_index].push(index);
                }
            }
            by_position.entry(claim.position).or_default().push(index);
        }

        // A claim with a child has been countered, regardless of what the snapshot reported.
        for (claim, kids) in claims.iter_mut().zip(children.iter()) {
            if !kids.is_empty() {
                claim.countered = true;
            }
        }

        Ok(Self {
            max_depth,
            claims,
            children,
            by_position,
        })
    }

    /// Returns the number of claims in the tree.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns `true` if the tree holds no claims.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Returns the maximum depth of the game.
    pub fn max_depth(&self) -> u64 {
        self.max_depth
    }

    /// Fetch the [ClaimData] at the given index in the DAG array.
    pub fn get(&self, index: usize) -> Result<&ClaimData> {
        self.claims
            .get(index)
            .ok_or(anyhow!("Invalid claim index: {}", index))
    }

    /// Returns every claim in ledger order.
    pub fn claims(&self) -> &[ClaimData] {
        &self.claims
    }

    /// Returns the root claim, if the tree is not empty.
    pub fn root(&self) -> Option<&ClaimData> {
        self.claims.first()
    }

    /// Returns the parent of the given claim, or `None` for the root.
    pub fn parent(&self, claim: &ClaimData) -> Option<&ClaimData> {
        claim.parent_index.and_then(|i| self.claims.get(i))
    }

    /// Returns the claims that directly counter the claim at `index`.
    pub fn children(&self, index: usize) -> impl Iterator<Item = &ClaimData> {
        self.children
            .get(index)
            .into_iter()
            .flatten()
            .map(move |&i| &self.claims[i])
    }

    /// Returns the claims made at the given position, in ledger order.
    pub fn at_position(&self, position: u128) -> impl Iterator<Item = &ClaimData> {
        self.by_position
            .get(&position)
            .into_iter()
            .flatten()
            .map(move |&i| &self.claims[i])
    }

    /// Returns `true` if `address` has already countered the claim at `index`.
    pub fn countered_by(&self, index: usize, address: Address) -> bool {
        self.children(index).any(|c| c.claimant == address)
    }

    /// Returns `true` if a claim with the same parent, position and value already exists. The
    /// contract rejects such a claim, so it must never be submitted.
    pub fn contains(&self, parent_index: usize, position: u128, claim: Claim) -> bool {
        self.at_position(position)
            .any(|c| c.parent_index == Some(parent_index) && c.claim == claim)
    }
}
