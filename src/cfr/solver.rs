//! Counterfactual Regret Minimization with Best Response (CFR-BR).
//!
//! Each iteration:
//! 1. expands the game tree and binds its info sets to the regret store,
//! 2. derives the current profile by regret matching,
//! 3. computes exact best responses for this iteration's responders,
//! 4. walks the tree once per learner, the learner playing its current
//!    strategy and every responder its best response,
//! 5. commits the accumulated regrets and strategy sums.
//!
//! Steps 1 and 2 are the only fallible ones, so a failed iteration leaves
//! the store untouched.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cfr::best_response::BestResponse;
use crate::cfr::config::{CfrBrConfig, SolverStats};
use crate::cfr::error::Result;
use crate::cfr::evaluator::nash_conv;
use crate::cfr::game::Game;
use crate::cfr::policy::{PolicyEntry, TabularPolicy};
use crate::cfr::storage::{InfoSetNode, RegretStorage, StorageExport};
use crate::cfr::tree::{GameTree, Node};

/// The CFR-BR solver.
///
/// # Type Parameters
/// - `G`: The game type implementing the `Game` trait
///
/// # Example
/// ```ignore
/// use cfr_br::cfr::{CfrBrSolver, CfrBrConfig};
///
/// let mut solver = CfrBrSolver::new(KuhnPoker::new(), CfrBrConfig::default())?;
/// solver.train(300)?;
/// let average = solver.average_policy();
/// ```
pub struct CfrBrSolver<G: Game> {
    /// The game being solved.
    game: G,

    /// Configuration for the solver.
    config: CfrBrConfig,

    /// Storage for regrets and strategy sums.
    storage: RegretStorage,

    /// Completed iterations.
    iteration: u64,

    /// Statistics tracking.
    stats: SolverStats,
}

impl<G: Game> CfrBrSolver<G> {
    /// Create a new solver for the given game.
    ///
    /// Every information set is registered up front, so the average policy
    /// of a solver that never iterated is uniform everywhere.
    pub fn new(game: G, config: CfrBrConfig) -> Result<Self> {
        config.validate(game.num_players())?;

        let tree = GameTree::build(&game)?;
        let mut storage = RegretStorage::with_capacity(tree.info_sets().len());
        storage.bind(&tree)?;

        log::info!(
            "cfr-br solver ready: {} players, {} nodes, {} info sets, {:?}",
            game.num_players(),
            tree.len(),
            storage.num_info_sets(),
            config.responder
        );

        Ok(Self {
            game,
            config,
            storage,
            iteration: 0,
            stats: SolverStats::new(),
        })
    }

    /// Run exactly one CFR-BR iteration.
    pub fn evaluate_and_update_policy(&mut self) -> Result<()> {
        let tree = GameTree::build(&self.game)?;
        let slots = self.storage.bind(&tree)?;

        let iteration = self.iteration + 1;
        let num_players = tree.num_players();
        let current: Vec<Vec<f64>> = slots
            .iter()
            .map(|&slot| self.storage.node(slot).current_strategy())
            .collect();

        let responders = self.config.responder.responders(iteration, num_players);
        let learners = self.config.responder.learners(iteration, num_players);
        let best_responses: Vec<BestResponse> = responders
            .par_iter()
            .map(|&player| BestResponse::compute(&tree, player, &current))
            .collect();

        let weight = if self.config.use_linear_averaging {
            iteration as f64
        } else {
            1.0
        };
        let mut deltas = Deltas::new(&tree);
        for &learner in &learners {
            let mut profile = current.clone();
            for response in best_responses.iter().filter(|br| br.player() != learner) {
                response.overwrite(&mut profile);
            }
            let mut reach = vec![1.0; num_players + 1];
            let mut pass = RegretPass {
                tree: &tree,
                learner,
                profile: &profile,
                weight,
                deltas: &mut deltas,
            };
            let value = pass.walk(tree.root(), &mut reach);
            log::trace!("iteration {iteration}: learner {learner} value {value:.6}");
        }

        for (info, set) in tree.info_sets().iter().enumerate() {
            if !learners.contains(&set.player) {
                continue;
            }
            let slot = slots[info];
            self.storage.add_regrets(slot, &deltas.regrets[info]);
            self.storage.add_strategy(slot, &deltas.strategy[info]);
            if self.config.use_cfr_plus {
                self.storage.floor_regrets(slot);
            }
        }

        self.iteration = iteration;
        log::debug!(
            "iteration {iteration}: responders {responders:?}, learners {learners:?}, {} info sets",
            self.storage.num_info_sets()
        );
        Ok(())
    }

    /// Train the solver for a specified number of iterations.
    pub fn train(&mut self, iterations: u64) -> Result<&SolverStats> {
        let start_time = Instant::now();
        log::info!("training {} iterations from iteration {}", iterations, self.iteration);

        for _ in 0..iterations {
            self.evaluate_and_update_policy()?;
        }

        self.refresh_stats(start_time);
        log::info!(
            "trained to iteration {} ({:.1} it/s)",
            self.iteration,
            self.stats.iterations_per_second
        );
        Ok(&self.stats)
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` iterations
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&SolverStats>
    where
        F: FnMut(&Self),
    {
        let start_time = Instant::now();
        let interval = callback_interval.max(1);

        for i in 0..iterations {
            self.evaluate_and_update_policy()?;

            if (i + 1) % interval == 0 {
                self.refresh_stats(start_time);
                callback(self);
            }
        }

        self.refresh_stats(start_time);
        Ok(&self.stats)
    }

    fn refresh_stats(&mut self, start_time: Instant) {
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.storage.num_info_sets();
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
    }

    /// NashConv of the current average policy, recorded in the stats.
    pub fn record_nash_conv(&mut self) -> Result<f64> {
        let value = nash_conv(&self.game, &self.average_policy())?;
        self.stats.record_nash_conv(self.iteration, value);
        log::info!("iteration {}: nash_conv {:.6}", self.iteration, value);
        Ok(value)
    }

    /// Regret-matched policy of the current iteration.
    pub fn current_policy(&self) -> TabularPolicy {
        self.snapshot(InfoSetNode::current_strategy)
    }

    /// Normalized strategy sums: the policy that converges to equilibrium.
    ///
    /// The returned table is a snapshot; later iterations do not affect it.
    pub fn average_policy(&self) -> TabularPolicy {
        self.snapshot(InfoSetNode::average_strategy)
    }

    fn snapshot(&self, strategy: impl Fn(&InfoSetNode) -> Vec<f64>) -> TabularPolicy {
        TabularPolicy::from_entries(self.storage.nodes().iter().map(|node| PolicyEntry {
            key: node.key.clone(),
            player: node.player,
            actions: node.actions.clone(),
            probs: strategy(node),
        }))
    }

    /// Get the current strategy for an information set.
    pub fn current_strategy(&self, info_key: &str) -> Option<Vec<f64>> {
        self.storage.current_strategy(info_key)
    }

    /// Get the average strategy for an information set.
    pub fn average_strategy(&self, info_key: &str) -> Option<Vec<f64>> {
        self.storage.average_strategy(info_key)
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Get the number of information sets discovered.
    pub fn num_info_sets(&self) -> usize {
        self.storage.num_info_sets()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Get reference to the storage for analysis.
    pub fn storage(&self) -> &RegretStorage {
        &self.storage
    }

    /// Get reference to the game.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &CfrBrConfig {
        &self.config
    }

    /// Export solver state for checkpointing.
    pub fn export_state(&self) -> SolverState {
        SolverState {
            iteration: self.iteration,
            config: self.config.clone(),
            storage: self.storage.export(),
            stats: self.stats.clone(),
        }
    }

    /// Import solver state from checkpoint.
    ///
    /// The checkpoint must describe this game; a mismatch leaves the solver
    /// unchanged.
    pub fn import_state(&mut self, state: SolverState) -> Result<()> {
        state.config.validate(self.game.num_players())?;

        let mut storage = RegretStorage::new();
        storage.import(state.storage);
        let tree = GameTree::build(&self.game)?;
        if let Err(err) = storage.bind(&tree) {
            log::warn!("checkpoint does not match the game: {err}");
            return Err(err);
        }

        self.iteration = state.iteration;
        self.config = state.config;
        self.storage = storage;
        self.stats = state.stats;
        Ok(())
    }

    /// Reset the solver to its freshly constructed state.
    pub fn reset(&mut self) -> Result<()> {
        let tree = GameTree::build(&self.game)?;
        let mut storage = RegretStorage::with_capacity(tree.info_sets().len());
        storage.bind(&tree)?;
        self.storage = storage;
        self.iteration = 0;
        self.stats = SolverStats::new();
        Ok(())
    }
}

/// Serializable solver state for checkpointing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverState {
    /// Completed iterations.
    pub iteration: u64,
    /// Configuration the state was trained with.
    pub config: CfrBrConfig,
    /// Storage export.
    pub storage: StorageExport,
    /// Statistics.
    pub stats: SolverStats,
}

impl SolverState {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a checkpoint produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<G: Game> Clone for CfrBrSolver<G> {
    fn clone(&self) -> Self {
        Self {
            game: self.game.clone(),
            config: self.config.clone(),
            storage: self.storage.clone(),
            iteration: self.iteration,
            stats: self.stats.clone(),
        }
    }
}

/// Per-info-set updates gathered during one iteration.
struct Deltas {
    regrets: Vec<Vec<f64>>,
    strategy: Vec<Vec<f64>>,
}

impl Deltas {
    fn new(tree: &GameTree) -> Self {
        let zeros: Vec<Vec<f64>> = tree
            .info_sets()
            .iter()
            .map(|info| vec![0.0; info.actions.len()])
            .collect();
        Self {
            regrets: zeros.clone(),
            strategy: zeros,
        }
    }
}

/// One learner's counterfactual-regret walk over the tree.
struct RegretPass<'a> {
    tree: &'a GameTree,
    learner: usize,
    profile: &'a [Vec<f64>],
    weight: f64,
    deltas: &'a mut Deltas,
}

impl RegretPass<'_> {
    /// Returns the learner's expected utility at `id`.
    ///
    /// `reach` holds one entry per player followed by chance.
    fn walk(&mut self, id: usize, reach: &mut [f64]) -> f64 {
        let tree = self.tree;
        match tree.node(id) {
            Node::Terminal { returns } => returns[self.learner],
            Node::Chance { outcomes } => {
                let chance = reach.len() - 1;
                let mut value = 0.0;
                for &(child, prob) in outcomes {
                    value += prob * self.descend(child, reach, chance, prob);
                }
                value
            }
            Node::Decision { player, info, children } if *player == self.learner => {
                let profile = self.profile;
                let strategy = &profile[*info];
                let mut action_values = vec![0.0; children.len()];
                for (a, &child) in children.iter().enumerate() {
                    action_values[a] = self.descend(child, reach, *player, strategy[a]);
                }

                let node_value: f64 = strategy.iter().zip(&action_values).map(|(s, v)| s * v).sum();
                let own = reach[self.learner];
                let counterfactual = others_reach(reach, self.learner);

                let regrets = &mut self.deltas.regrets[*info];
                for (r, v) in regrets.iter_mut().zip(&action_values) {
                    *r += counterfactual * (v - node_value);
                }
                let sums = &mut self.deltas.strategy[*info];
                for (s, p) in sums.iter_mut().zip(strategy) {
                    *s += self.weight * own * p;
                }
                node_value
            }
            Node::Decision { player, info, children } => {
                let profile = self.profile;
                let mut value = 0.0;
                for (&child, &prob) in children.iter().zip(&profile[*info]) {
                    value += prob * self.descend(child, reach, *player, prob);
                }
                value
            }
        }
    }

    /// Walk `child` with `reach[actor]` scaled by `prob`.
    ///
    /// Subtrees that neither the learner nor the counterfactual reaches
    /// contribute nothing and are skipped.
    fn descend(&mut self, child: usize, reach: &mut [f64], actor: usize, prob: f64) -> f64 {
        let saved = reach[actor];
        reach[actor] *= prob;
        let value = if reach[self.learner] == 0.0 && others_reach(reach, self.learner) == 0.0 {
            0.0
        } else {
            self.walk(child, reach)
        };
        reach[actor] = saved;
        value
    }
}

fn others_reach(reach: &[f64], player: usize) -> f64 {
    reach
        .iter()
        .enumerate()
        .filter(|&(p, _)| p != player)
        .map(|(_, r)| r)
        .product()
}
