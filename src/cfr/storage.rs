//! Storage for CFR regrets and strategy sums.
//!
//! One [`InfoSetNode`] per information set, kept in first-visit order so that
//! two runs over the same game produce byte-identical tables. The store is
//! owned by a single solver and mutated only from its iteration loop.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::error::{Result, SolverError};
use crate::cfr::tree::GameTree;

/// Regret matching: play proportionally to positive cumulative regret.
///
/// Falls back to the uniform distribution when no regret is positive.
pub fn regret_match(regrets: &[f64]) -> Vec<f64> {
    let positive_sum: f64 = regrets.iter().filter(|&&r| r > 0.0).sum();

    if positive_sum > 0.0 {
        regrets
            .iter()
            .map(|&r| if r > 0.0 { r / positive_sum } else { 0.0 })
            .collect()
    } else {
        uniform(regrets.len())
    }
}

/// Normalize non-negative weights into a distribution.
///
/// Used for average-policy extraction: an info set whose strategy sum is zero
/// (never reached by its owner) averages to uniform.
pub fn normalize_or_uniform(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();

    if total > 0.0 {
        weights.iter().map(|&w| w / total).collect()
    } else {
        uniform(weights.len())
    }
}

pub(crate) fn uniform(num_actions: usize) -> Vec<f64> {
    vec![1.0 / num_actions as f64; num_actions]
}

/// Learning state of one information set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoSetNode {
    /// Opaque information-set key.
    pub key: String,
    /// Player acting at this information set.
    pub player: usize,
    /// Ordered legal action names.
    pub actions: Vec<String>,
    /// Cumulative counterfactual regret per action.
    pub regrets: Vec<f64>,
    /// Cumulative reach-weighted strategy per action.
    pub strategy_sum: Vec<f64>,
    /// Number of iterations that updated this info set.
    pub updates: u64,
}

impl InfoSetNode {
    /// Fresh node with zero regret and zero strategy weight.
    pub fn new(key: String, player: usize, actions: Vec<String>) -> Self {
        let num_actions = actions.len();
        Self {
            key,
            player,
            actions,
            regrets: vec![0.0; num_actions],
            strategy_sum: vec![0.0; num_actions],
            updates: 0,
        }
    }

    /// Number of legal actions.
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Current strategy by regret matching. Recomputed on every call.
    pub fn current_strategy(&self) -> Vec<f64> {
        regret_match(&self.regrets)
    }

    /// Average strategy over all updates so far.
    pub fn average_strategy(&self) -> Vec<f64> {
        normalize_or_uniform(&self.strategy_sum)
    }

    fn check(&self, player: usize, actions: &[String]) -> Result<()> {
        if self.regrets.len() != self.num_actions() || self.strategy_sum.len() != self.num_actions() {
            return Err(SolverError::Checkpoint(format!(
                "info set `{}` has {} actions but {} regrets and {} strategy weights",
                self.key,
                self.num_actions(),
                self.regrets.len(),
                self.strategy_sum.len()
            )));
        }
        if self.player != player {
            return Err(SolverError::PlayerMismatch {
                key: self.key.clone(),
                owner: self.player,
                player,
            });
        }
        if self.actions != actions {
            return Err(SolverError::ActionSetMismatch {
                key: self.key.clone(),
                expected: self.actions.clone(),
                found: actions.to_vec(),
            });
        }
        Ok(())
    }
}

/// Regret and strategy-sum tables keyed by information-set key.
///
/// This struct manages the core data structures used by CFR:
/// - **Regrets**: Cumulative counterfactual regret for each action at each info set
/// - **Strategy sums**: Cumulative strategy weights for computing average strategy
#[derive(Debug, Clone, Default)]
pub struct RegretStorage {
    /// Nodes in first-visit order.
    nodes: Vec<InfoSetNode>,

    /// info_key -> position in `nodes`
    index: FxHashMap<String, usize>,
}

impl RegretStorage {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Resolve every info set of `tree` to a slot, creating missing ones.
    ///
    /// Returns the slot of each tree info set, in tree order. All existing
    /// entries are checked before anything is inserted, so a mismatch leaves
    /// the store untouched.
    pub fn bind(&mut self, tree: &GameTree) -> Result<Vec<usize>> {
        let mut fresh = Vec::new();
        for info in tree.info_sets() {
            match self.index.get(&info.key) {
                Some(&slot) => self.nodes[slot].check(info.player, &info.actions)?,
                None => fresh.push(info),
            }
        }

        for info in fresh {
            self.index.insert(info.key.clone(), self.nodes.len());
            self.nodes.push(InfoSetNode::new(
                info.key.clone(),
                info.player,
                info.actions.clone(),
            ));
        }

        Ok(tree
            .info_sets()
            .iter()
            .map(|info| self.index[&info.key])
            .collect())
    }

    /// Node at a slot returned by [`bind`](Self::bind).
    pub fn node(&self, slot: usize) -> &InfoSetNode {
        &self.nodes[slot]
    }

    /// Look up a node by key.
    pub fn get(&self, info_key: &str) -> Option<&InfoSetNode> {
        self.index.get(info_key).map(|&slot| &self.nodes[slot])
    }

    /// All nodes in first-visit order.
    pub fn nodes(&self) -> &[InfoSetNode] {
        &self.nodes
    }

    /// Regret-matched strategy for an info set, if known.
    pub fn current_strategy(&self, info_key: &str) -> Option<Vec<f64>> {
        self.get(info_key).map(InfoSetNode::current_strategy)
    }

    /// Average strategy for an info set, if known.
    pub fn average_strategy(&self, info_key: &str) -> Option<Vec<f64>> {
        self.get(info_key).map(InfoSetNode::average_strategy)
    }

    /// Add instantaneous regrets to a slot.
    pub fn add_regrets(&mut self, slot: usize, deltas: &[f64]) {
        let node = &mut self.nodes[slot];
        debug_assert_eq!(node.regrets.len(), deltas.len(), "regret length for {}", node.key);
        for (regret, delta) in node.regrets.iter_mut().zip(deltas) {
            *regret += delta;
        }
        node.updates += 1;
    }

    /// Add weighted strategy probabilities to a slot.
    pub fn add_strategy(&mut self, slot: usize, deltas: &[f64]) {
        let node = &mut self.nodes[slot];
        debug_assert_eq!(node.strategy_sum.len(), deltas.len(), "strategy length for {}", node.key);
        for (sum, delta) in node.strategy_sum.iter_mut().zip(deltas) {
            *sum += delta;
        }
    }

    /// Floor cumulative regrets at zero (regret-matching+).
    pub fn floor_regrets(&mut self, slot: usize) {
        for regret in self.nodes[slot].regrets.iter_mut() {
            if *regret < 0.0 {
                *regret = 0.0;
            }
        }
    }

    /// Get the number of information sets stored.
    pub fn num_info_sets(&self) -> usize {
        self.nodes.len()
    }

    /// Export storage to serializable format.
    pub fn export(&self) -> StorageExport {
        StorageExport {
            nodes: self.nodes.clone(),
        }
    }

    /// Import storage from serialized format.
    pub fn import(&mut self, data: StorageExport) {
        self.index = data
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.key.clone(), slot))
            .collect();
        self.nodes = data.nodes;
    }
}

/// Serializable export format for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageExport {
    /// Nodes in first-visit order.
    pub nodes: Vec<InfoSetNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::KuhnPoker;

    #[test]
    fn positive_regrets_normalized() {
        let strategy = regret_match(&[1.0, 2.0, 3.0]);
        assert!((strategy[0] - 1.0 / 6.0).abs() < 1e-12);
        assert!((strategy[1] - 2.0 / 6.0).abs() < 1e-12);
        assert!((strategy[2] - 3.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn negative_regrets_are_ignored() {
        let strategy = regret_match(&[-1.0, 2.0, 6.0]);
        assert_eq!(strategy[0], 0.0);
        assert!((strategy[1] - 0.25).abs() < 1e-12);
        assert!((strategy[2] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn non_positive_regrets_give_uniform() {
        assert_eq!(regret_match(&[0.0, -3.0]), vec![0.5, 0.5]);
        assert_eq!(normalize_or_uniform(&[0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
    }

    #[test]
    fn bind_registers_every_info_set_once() {
        let tree = GameTree::build(&KuhnPoker::new()).unwrap();
        let mut storage = RegretStorage::new();

        let slots = storage.bind(&tree).unwrap();
        assert_eq!(storage.num_info_sets(), 12);
        assert_eq!(slots, (0..12).collect::<Vec<_>>());

        let again = storage.bind(&tree).unwrap();
        assert_eq!(slots, again);
        assert_eq!(storage.num_info_sets(), 12);
    }

    #[test]
    fn bind_rejects_changed_actions_without_mutation() {
        let tree = GameTree::build(&KuhnPoker::new()).unwrap();
        let mut storage = RegretStorage::new();
        storage.bind(&tree).unwrap();

        storage.nodes[3].actions.push("Raise".to_string());
        let before = storage.export();

        let err = storage.bind(&tree).unwrap_err();
        assert!(matches!(err, SolverError::ActionSetMismatch { .. }));
        assert_eq!(storage.export(), before);
    }

    #[test]
    fn bind_rejects_truncated_tables() {
        let tree = GameTree::build(&KuhnPoker::new()).unwrap();
        let mut storage = RegretStorage::new();
        storage.bind(&tree).unwrap();

        let mut data = storage.export();
        data.nodes[0].regrets = vec![1.0];
        let mut restored = RegretStorage::new();
        restored.import(data);

        let err = restored.bind(&tree).unwrap_err();
        assert!(matches!(err, SolverError::Checkpoint(_)), "{err:?}");

        let mut data = storage.export();
        data.nodes[4].strategy_sum.push(0.0);
        restored.import(data);
        assert!(matches!(restored.bind(&tree), Err(SolverError::Checkpoint(_))));
    }

    #[test]
    fn floor_and_accumulate() {
        let mut storage = RegretStorage::new();
        let tree = GameTree::build(&KuhnPoker::new()).unwrap();
        storage.bind(&tree).unwrap();

        storage.add_regrets(0, &[-2.0, 1.0]);
        storage.add_strategy(0, &[0.25, 0.75]);
        assert_eq!(storage.node(0).current_strategy(), vec![0.0, 1.0]);
        assert_eq!(storage.node(0).updates, 1);

        storage.floor_regrets(0);
        assert_eq!(storage.node(0).regrets, vec![0.0, 1.0]);
        assert_eq!(storage.node(0).average_strategy(), vec![0.25, 0.75]);
    }

    #[test]
    fn export_import_preserves_order() {
        let tree = GameTree::build(&KuhnPoker::new()).unwrap();
        let mut storage = RegretStorage::new();
        storage.bind(&tree).unwrap();
        storage.add_regrets(5, &[1.0, -1.0]);

        let mut restored = RegretStorage::new();
        restored.import(storage.export());

        assert_eq!(restored.export(), storage.export());
        assert_eq!(restored.bind(&tree).unwrap(), (0..12).collect::<Vec<_>>());
    }
}
