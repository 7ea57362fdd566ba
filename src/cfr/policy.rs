//! Policies: maps from information-set key to a distribution over actions.

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::error::{Result, SolverError};
use crate::cfr::game::Game;
use crate::cfr::storage::uniform;
use crate::cfr::tree::GameTree;

/// Anything that can answer "how does the owner of `key` play?".
pub trait Policy {
    /// Action probabilities at `info_key`, in legal-action order.
    fn probabilities(&self, info_key: &str) -> Option<&[f64]>;
}

/// One row of a [`TabularPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// Information-set key.
    pub key: String,
    /// Player acting at the info set.
    pub player: usize,
    /// Ordered legal action names.
    pub actions: Vec<String>,
    /// Probability per action.
    pub probs: Vec<f64>,
}

/// Table-backed policy with deterministic (insertion) iteration order.
///
/// Average policies extracted from a solver are immutable snapshots: nothing
/// the solver does afterwards changes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PolicyEntry>", into = "Vec<PolicyEntry>")]
pub struct TabularPolicy {
    entries: Vec<PolicyEntry>,
    index: FxHashMap<String, usize>,
}

impl TabularPolicy {
    /// Empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries; a repeated key keeps its first position and its
    /// last value.
    pub fn from_entries(entries: impl IntoIterator<Item = PolicyEntry>) -> Self {
        let mut policy = TabularPolicy::new();
        for entry in entries {
            policy.insert(entry);
        }
        policy
    }

    /// Uniform distribution at every information set of `game`.
    pub fn uniform<G: Game>(game: &G) -> Result<Self> {
        let tree = GameTree::build(game)?;
        let profile: Vec<Vec<f64>> = tree
            .info_sets()
            .iter()
            .map(|info| uniform(info.actions.len()))
            .collect();
        Ok(Self::from_profile(&tree, &profile))
    }

    /// Independent random distribution at every information set of `game`.
    pub fn random<G: Game, R: Rng>(game: &G, rng: &mut R) -> Result<Self> {
        let tree = GameTree::build(game)?;
        let profile: Vec<Vec<f64>> = tree
            .info_sets()
            .iter()
            .map(|info| {
                let weights: Vec<f64> = (0..info.actions.len()).map(|_| rng.gen::<f64>()).collect();
                let total: f64 = weights.iter().sum();
                if total > 0.0 {
                    weights.iter().map(|w| w / total).collect()
                } else {
                    uniform(weights.len())
                }
            })
            .collect();
        Ok(Self::from_profile(&tree, &profile))
    }

    /// Build from per-info-set distributions of a tree.
    pub(crate) fn from_profile(tree: &GameTree, profile: &[Vec<f64>]) -> Self {
        Self::from_entries(tree.info_sets().iter().zip(profile).map(|(info, probs)| PolicyEntry {
            key: info.key.clone(),
            player: info.player,
            actions: info.actions.clone(),
            probs: probs.clone(),
        }))
    }

    /// Insert or replace the entry for `entry.key`.
    pub fn insert(&mut self, entry: PolicyEntry) {
        match self.index.get(&entry.key) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Override entries with those of `other` (e.g. plug a best response in
    /// for one player). Keys only in `other` are appended.
    pub fn merge(&mut self, other: &TabularPolicy) {
        for entry in &other.entries {
            self.insert(entry.clone());
        }
    }

    /// Entry for a key.
    pub fn get(&self, info_key: &str) -> Option<&PolicyEntry> {
        self.index.get(info_key).map(|&slot| &self.entries[slot])
    }

    /// Number of information sets covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the policy covers no information set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PolicyEntry> {
        self.entries.iter()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Entries belonging to one player.
    pub fn player_entries(&self, player: usize) -> impl Iterator<Item = &PolicyEntry> {
        self.entries.iter().filter(move |e| e.player == player)
    }

    /// Pretty JSON dump.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a dump produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Policy for TabularPolicy {
    fn probabilities(&self, info_key: &str) -> Option<&[f64]> {
        self.get(info_key).map(|e| e.probs.as_slice())
    }
}

impl From<Vec<PolicyEntry>> for TabularPolicy {
    fn from(entries: Vec<PolicyEntry>) -> Self {
        TabularPolicy::from_entries(entries)
    }
}

impl From<TabularPolicy> for Vec<PolicyEntry> {
    fn from(policy: TabularPolicy) -> Self {
        policy.entries
    }
}

/// Look up `policy` at every info set of `tree`.
///
/// Info sets owned by `skip` get a uniform placeholder instead; callers use
/// this when that player's strategy is about to be replaced.
pub(crate) fn tree_profile<P: Policy + ?Sized>(
    tree: &GameTree,
    policy: &P,
    skip: Option<usize>,
) -> Result<Vec<Vec<f64>>> {
    tree.info_sets()
        .iter()
        .map(|info| {
            if Some(info.player) == skip {
                return Ok(uniform(info.actions.len()));
            }
            let probs = policy
                .probabilities(&info.key)
                .ok_or_else(|| SolverError::MissingPolicy { key: info.key.clone() })?;
            if probs.len() != info.actions.len() {
                return Err(SolverError::PolicyLength {
                    key: info.key.clone(),
                    expected: info.actions.len(),
                    found: probs.len(),
                });
            }
            Ok(probs.to_vec())
        })
        .collect()
}
