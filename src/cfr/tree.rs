//! Transient expansion of a game into an arena of nodes.
//!
//! A [`GameTree`] is built by the call that needs it and dropped when that
//! call returns. Building it is where the game's contract is checked, so the
//! traversals that run on it afterwards cannot fail.

use rustc_hash::FxHashMap;

use crate::cfr::error::{Result, SolverError};
use crate::cfr::game::{Game, InfoState};

/// Allowed deviation of a chance distribution's sum from one.
pub const CHANCE_TOLERANCE: f64 = 1e-6;

/// One node of the expanded game.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Game over; utility per player.
    Terminal {
        /// Utility vector of length `num_players`.
        returns: Vec<f64>,
    },
    /// Nature moves.
    Chance {
        /// `(child, probability)` per outcome.
        outcomes: Vec<(usize, f64)>,
    },
    /// A player moves.
    Decision {
        /// Acting player.
        player: usize,
        /// Index into [`GameTree::info_sets`].
        info: usize,
        /// Child per legal action, in action order.
        children: Vec<usize>,
    },
}

/// An information set as seen by one tree expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeInfoSet {
    /// Opaque key reported by the game.
    pub key: String,
    /// Owning player.
    pub player: usize,
    /// Ordered legal action names.
    pub actions: Vec<String>,
    /// Decision nodes that belong to this set.
    pub nodes: Vec<usize>,
}

/// Full game tree. Node `0` is the root; children always have larger ids
/// than their parent.
#[derive(Debug, Clone)]
pub struct GameTree {
    num_players: usize,
    nodes: Vec<Node>,
    info_sets: Vec<TreeInfoSet>,
    index: FxHashMap<String, usize>,
}

impl GameTree {
    /// Expand `game` from its initial state.
    pub fn build<G: Game>(game: &G) -> Result<Self> {
        let mut tree = Self {
            num_players: game.num_players(),
            nodes: Vec::new(),
            info_sets: Vec::new(),
            index: FxHashMap::default(),
        };
        tree.expand(game, &game.initial_state())?;
        log::trace!(
            "built game tree: {} nodes, {} info sets",
            tree.nodes.len(),
            tree.info_sets.len()
        );
        Ok(tree)
    }

    fn expand<G: Game>(&mut self, game: &G, state: &G::State) -> Result<usize> {
        let id = self.nodes.len();

        if game.is_terminal(state) {
            let returns = game.returns(state);
            if returns.len() != self.num_players {
                return Err(SolverError::ReturnsLength {
                    expected: self.num_players,
                    found: returns.len(),
                });
            }
            self.nodes.push(Node::Terminal { returns });
            return Ok(id);
        }

        if game.is_chance(state) {
            let outcomes = game.chance_outcomes(state);
            let sum: f64 = outcomes.iter().map(|(_, p)| p).sum();
            let valid = !outcomes.is_empty()
                && outcomes.iter().all(|(_, p)| p.is_finite() && *p >= 0.0)
                && (sum - 1.0).abs() <= CHANCE_TOLERANCE;
            if !valid {
                return Err(SolverError::InvalidChanceOutcomes { sum });
            }

            self.nodes.push(Node::Chance { outcomes: Vec::new() });
            let mut children = Vec::with_capacity(outcomes.len());
            for (action, prob) in &outcomes {
                let child = self.expand(game, &game.apply_action(state, action))?;
                children.push((child, *prob));
            }
            self.nodes[id] = Node::Chance { outcomes: children };
            return Ok(id);
        }

        let player = game.current_player(state).ok_or_else(|| {
            SolverError::InvalidState(format!(
                "no acting player at non-terminal, non-chance state {}",
                game.state_description(state)
            ))
        })?;
        if player >= self.num_players {
            return Err(SolverError::InvalidPlayer {
                player,
                num_players: self.num_players,
            });
        }

        let key = game.info_state(state, player).key();
        let actions = game.available_actions(state);
        if actions.is_empty() {
            return Err(SolverError::NoLegalActions { key });
        }
        let names: Vec<String> = actions.iter().map(|a| game.action_name(a)).collect();
        let info = self.register(key, player, names, id)?;

        self.nodes.push(Node::Decision {
            player,
            info,
            children: Vec::new(),
        });
        let mut children = Vec::with_capacity(actions.len());
        for action in &actions {
            children.push(self.expand(game, &game.apply_action(state, action))?);
        }
        if let Node::Decision { children: slot, .. } = &mut self.nodes[id] {
            *slot = children;
        }
        Ok(id)
    }

    fn register(&mut self, key: String, player: usize, actions: Vec<String>, node: usize) -> Result<usize> {
        if let Some(&info) = self.index.get(&key) {
            let known = &mut self.info_sets[info];
            if known.player != player {
                return Err(SolverError::PlayerMismatch {
                    key,
                    owner: known.player,
                    player,
                });
            }
            if known.actions != actions {
                return Err(SolverError::ActionSetMismatch {
                    key,
                    expected: known.actions.clone(),
                    found: actions,
                });
            }
            known.nodes.push(node);
            return Ok(info);
        }

        let info = self.info_sets.len();
        self.index.insert(key.clone(), info);
        self.info_sets.push(TreeInfoSet {
            key,
            player,
            actions,
            nodes: vec![node],
        });
        Ok(info)
    }

    /// Root node id.
    pub fn root(&self) -> usize {
        0
    }

    /// Number of players of the expanded game.
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Node by id.
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// All nodes; index is the node id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Information sets in first-visit order.
    pub fn info_sets(&self) -> &[TreeInfoSet] {
        &self.info_sets
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes (never true for a built tree).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Expected utility vector at the root when every info set plays
    /// `profile[info]`.
    pub fn expected_values(&self, profile: &[Vec<f64>]) -> Vec<f64> {
        let mut values = vec![Vec::new(); self.nodes.len()];
        for id in (0..self.nodes.len()).rev() {
            values[id] = match &self.nodes[id] {
                Node::Terminal { returns } => returns.clone(),
                Node::Chance { outcomes } => {
                    weighted_sum(self.num_players, outcomes.iter().map(|&(c, p)| (p, &values[c])))
                }
                Node::Decision { info, children, .. } => weighted_sum(
                    self.num_players,
                    profile[*info].iter().zip(children).map(|(&p, &c)| (p, &values[c])),
                ),
            };
        }
        values.swap_remove(0)
    }
}

pub(crate) fn weighted_sum<'a>(
    num_players: usize,
    terms: impl Iterator<Item = (f64, &'a Vec<f64>)>,
) -> Vec<f64> {
    let mut total = vec![0.0; num_players];
    for (weight, value) in terms {
        if weight == 0.0 {
            continue;
        }
        for (t, v) in total.iter_mut().zip(value) {
            *t += weight * v;
        }
    }
    total
}
