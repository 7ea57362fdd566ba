//! Exact best responses by backward induction.
//!
//! The responder's choice at an information set maximizes
//!
//! ```text
//! sum over h in I of  reach_-p(h) * v_p(h . a)
//! ```
//!
//! where `reach_-p` is the product of chance and opponent probabilities on
//! the path to `h`. Values of deeper nodes depend on choices at deeper info
//! sets only, so values and choices are memoized and filled in on demand.

use crate::cfr::error::{Result, SolverError};
use crate::cfr::game::Game;
use crate::cfr::policy::{tree_profile, Policy, PolicyEntry, TabularPolicy};
use crate::cfr::tree::{weighted_sum, GameTree, Node};

/// Best response of one player on a specific [`GameTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct BestResponse {
    player: usize,
    /// Chosen action per tree info set; `Some` exactly for the responder's.
    actions: Vec<Option<usize>>,
    value: Vec<f64>,
}

impl BestResponse {
    /// Best response of `player` when every other info set plays
    /// `profile[info]`. The responder's own rows of `profile` are ignored.
    pub fn compute(tree: &GameTree, player: usize, profile: &[Vec<f64>]) -> Self {
        let mut search = Search {
            tree,
            player,
            profile,
            reach: opponent_reach(tree, player, profile),
            values: vec![Vec::new(); tree.len()],
            done: vec![false; tree.len()],
            choices: vec![None; tree.info_sets().len()],
        };

        search.evaluate(tree.root());
        let value = std::mem::take(&mut search.values[tree.root()]);

        // unreachable info sets still need an action
        for (info, set) in tree.info_sets().iter().enumerate() {
            if set.player == player {
                search.choose(info);
            }
        }

        Self {
            player,
            actions: search.choices,
            value,
        }
    }

    /// The responding player.
    pub fn player(&self) -> usize {
        self.player
    }

    /// Root value vector with the responder playing this best response.
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Replace the responder's rows of `profile` with the deterministic choice.
    pub fn overwrite(&self, profile: &mut [Vec<f64>]) {
        for (row, choice) in profile.iter_mut().zip(&self.actions) {
            if let Some(best) = *choice {
                row.iter_mut().enumerate().for_each(|(a, p)| *p = if a == best { 1.0 } else { 0.0 });
            }
        }
    }

    /// Deterministic policy over the responder's info sets.
    pub fn to_policy(&self, tree: &GameTree) -> TabularPolicy {
        let mut policy = TabularPolicy::new();
        for (set, choice) in tree.info_sets().iter().zip(&self.actions) {
            if let Some(best) = *choice {
                policy.insert(PolicyEntry {
                    key: set.key.clone(),
                    player: set.player,
                    actions: set.actions.clone(),
                    probs: (0..set.actions.len()).map(|a| if a == best { 1.0 } else { 0.0 }).collect(),
                });
            }
        }
        policy
    }
}

/// Counterfactual reach of every node from `player`'s point of view.
fn opponent_reach(tree: &GameTree, player: usize, profile: &[Vec<f64>]) -> Vec<f64> {
    let mut reach = vec![0.0; tree.len()];
    reach[tree.root()] = 1.0;
    // parents precede children, so one forward sweep suffices
    for (id, node) in tree.nodes().iter().enumerate() {
        let here = reach[id];
        match node {
            Node::Terminal { .. } => {}
            Node::Chance { outcomes } => {
                for &(child, prob) in outcomes {
                    reach[child] = here * prob;
                }
            }
            Node::Decision { player: acting, info, children } => {
                for (a, &child) in children.iter().enumerate() {
                    reach[child] = if *acting == player { here } else { here * profile[*info][a] };
                }
            }
        }
    }
    reach
}

struct Search<'a> {
    tree: &'a GameTree,
    player: usize,
    profile: &'a [Vec<f64>],
    reach: Vec<f64>,
    values: Vec<Vec<f64>>,
    done: Vec<bool>,
    choices: Vec<Option<usize>>,
}

impl Search<'_> {
    fn evaluate(&mut self, id: usize) {
        if self.done[id] {
            return;
        }
        let tree = self.tree;
        let profile = self.profile;
        let value = match tree.node(id) {
            Node::Terminal { returns } => returns.clone(),
            Node::Chance { outcomes } => {
                for &(child, _) in outcomes {
                    self.evaluate(child);
                }
                weighted_sum(
                    tree.num_players(),
                    outcomes.iter().map(|&(c, p)| (p, &self.values[c])),
                )
            }
            Node::Decision { player, info, children } if *player == self.player => {
                let best = self.choose(*info);
                self.evaluate(children[best]);
                self.values[children[best]].clone()
            }
            Node::Decision { info, children, .. } => {
                let probs = &profile[*info];
                for (&child, &p) in children.iter().zip(probs) {
                    if p > 0.0 {
                        self.evaluate(child);
                    }
                }
                weighted_sum(
                    tree.num_players(),
                    probs.iter().zip(children).map(|(&p, &c)| (p, &self.values[c])),
                )
            }
        };
        self.values[id] = value;
        self.done[id] = true;
    }

    fn choose(&mut self, info: usize) -> usize {
        if let Some(best) = self.choices[info] {
            return best;
        }
        let tree = self.tree;
        let set = &tree.info_sets()[info];
        let mut totals = vec![0.0; set.actions.len()];

        for &node in &set.nodes {
            let weight = self.reach[node];
            if weight == 0.0 {
                continue;
            }
            if let Node::Decision { children, .. } = tree.node(node) {
                for (a, &child) in children.iter().enumerate() {
                    self.evaluate(child);
                    totals[a] += weight * self.values[child][self.player];
                }
            }
        }

        // strict comparison keeps the first maximizer
        let mut best = 0;
        for (a, &total) in totals.iter().enumerate().skip(1) {
            if total > totals[best] {
                best = a;
            }
        }
        self.choices[info] = Some(best);
        best
    }
}

/// A best response against a policy, expressed over game keys.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResponsePolicy {
    /// The responding player.
    pub player: usize,
    /// Root value vector with the responder playing `policy`.
    pub value: Vec<f64>,
    /// Deterministic policy over every info set of the responder.
    pub policy: TabularPolicy,
}

/// Exact best response of `player` to `policy` (which must cover every info
/// set of the other players).
pub fn best_response<G, P>(game: &G, policy: &P, player: usize) -> Result<BestResponsePolicy>
where
    G: Game,
    P: Policy + ?Sized,
{
    check_player(game, player)?;
    let tree = GameTree::build(game)?;
    let profile = tree_profile(&tree, policy, Some(player))?;
    let response = BestResponse::compute(&tree, player, &profile);
    Ok(BestResponsePolicy {
        player,
        policy: response.to_policy(&tree),
        value: response.value,
    })
}

/// Value `player` achieves by best-responding to `policy`.
pub fn best_response_value<G, P>(game: &G, policy: &P, player: usize) -> Result<f64>
where
    G: Game,
    P: Policy + ?Sized,
{
    Ok(best_response(game, policy, player)?.value[player])
}

pub(crate) fn check_player<G: Game>(game: &G, player: usize) -> Result<()> {
    if player >= game.num_players() {
        return Err(SolverError::InvalidPlayer {
            player,
            num_players: game.num_players(),
        });
    }
    Ok(())
}
