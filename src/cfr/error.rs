//! Error types for the CFR-BR engine.
//!
//! Every variant is a precondition violation: the offending call returns
//! before any regret or strategy sum is touched. Numerical degeneracies
//! (all-negative regrets, empty strategy sums) are never errors; they fall
//! back to the uniform distribution where they occur.

use thiserror::Error;

/// Errors produced while building trees, solving or evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// A decision node offered no legal actions.
    #[error("decision node for info set `{key}` has no legal actions")]
    NoLegalActions {
        /// Information-set key of the node.
        key: String,
    },

    /// The same information-set key came back with a different action list.
    #[error("info set `{key}` changed its legal actions: expected {expected:?}, found {found:?}")]
    ActionSetMismatch {
        /// Information-set key.
        key: String,
        /// Action names recorded on first visit.
        expected: Vec<String>,
        /// Action names reported now.
        found: Vec<String>,
    },

    /// Two players reported the same information-set key.
    #[error("info set `{key}` belongs to player {owner} but was reached by player {player}")]
    PlayerMismatch {
        /// Information-set key.
        key: String,
        /// Player recorded on first visit.
        owner: usize,
        /// Player reporting the key now.
        player: usize,
    },

    /// A terminal utility vector had the wrong length.
    #[error("terminal returns have length {found}, game has {expected} players")]
    ReturnsLength {
        /// Number of players in the game.
        expected: usize,
        /// Length of the returned vector.
        found: usize,
    },

    /// A chance node distribution was empty, negative or did not sum to one.
    #[error("chance outcomes do not form a distribution (sum = {sum})")]
    InvalidChanceOutcomes {
        /// Sum of the reported probabilities.
        sum: f64,
    },

    /// A state that is neither terminal, chance, nor has an acting player.
    #[error("invalid game state: {0}")]
    InvalidState(String),

    /// A policy was queried for a key it does not cover.
    #[error("policy has no entry for info set `{key}`")]
    MissingPolicy {
        /// Information-set key.
        key: String,
    },

    /// A policy distribution did not match the info set's action count.
    #[error("policy for info set `{key}` has {found} probabilities, expected {expected}")]
    PolicyLength {
        /// Information-set key.
        key: String,
        /// Number of legal actions.
        expected: usize,
        /// Number of probabilities supplied.
        found: usize,
    },

    /// A player index outside `0..num_players`.
    #[error("player {player} out of range for a {num_players}-player game")]
    InvalidPlayer {
        /// Requested player.
        player: usize,
        /// Number of players in the game.
        num_players: usize,
    },

    /// Exploitability requested for a game that is not two-player zero-sum.
    #[error("exploitability is only defined for two-player zero-sum games")]
    NotTwoPlayerZeroSum,

    /// The on-policy values of a supposedly zero-sum game do not cancel.
    #[error("policy values {values:?} are not zero-sum")]
    NotZeroSumValue {
        /// Expected returns per player.
        values: Vec<f64>,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A checkpoint could not be serialized or parsed.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

impl From<serde_json::Error> for SolverError {
    fn from(err: serde_json::Error) -> Self {
        SolverError::Checkpoint(err.to_string())
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, SolverError>;
