//! Game trait definition for the CFR-BR engine.
//!
//! The engine never looks inside a game. Everything it needs (legal actions,
//! chance distributions, transitions, terminal utilities and information-set
//! keys) comes through the `Game` trait below.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for actions that can be taken in a game.
///
/// Actions must be cloneable, comparable, and hashable for storage in maps.
pub trait Action: Clone + Eq + Hash + Debug + Send + Sync {
    /// Convert action to a string representation for display/storage.
    fn to_string(&self) -> String;
}

/// Trait for information states (what a player knows at a decision point).
///
/// Two game states that look identical to a player (same private cards, same
/// public history) must produce the same information state, and therefore
/// the same key.
pub trait InfoState: Clone + Eq + Hash + Debug + Send + Sync {
    /// Unique string key for this information state.
    ///
    /// Keys must be unique per player: two different players may never
    /// report the same key.
    fn key(&self) -> String;
}

/// Trait for game states.
///
/// A game state contains all information about the current state of the game,
/// including private information that players may not see.
pub trait GameState: Clone + Debug + Send + Sync {}

/// The main Game trait that defines the interface for any game.
///
/// # Type Parameters
/// - `State`: The game state type
/// - `Action`: The action type (player moves and chance outcomes)
/// - `InfoState`: The information state type
///
/// # Contract
/// - Exactly one of `is_terminal`, `is_chance` or `current_player().is_some()`
///   holds for every state.
/// - `available_actions` returns the same ordered list every time the same
///   information-set key is reached.
/// - `chance_outcomes` probabilities are non-negative and sum to one.
/// - `returns` has exactly `num_players()` entries.
pub trait Game: Clone + Send + Sync {
    /// The type representing a complete game state.
    type State: GameState;

    /// The type representing an action a player (or chance) can take.
    type Action: Action;

    /// The type representing what a player knows at a decision point.
    type InfoState: InfoState;

    /// Create the initial game state (the root of the game tree).
    fn initial_state(&self) -> Self::State;

    /// Get the total number of players in the game.
    fn num_players(&self) -> usize;

    /// Check if the given state is terminal (game over).
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Check if the current state is a chance node.
    fn is_chance(&self, state: &Self::State) -> bool;

    /// Get the index of the player who should act at the current state.
    ///
    /// # Returns
    /// - `Some(player_index)` if a player should act
    /// - `None` if the state is terminal or a chance node
    fn current_player(&self, state: &Self::State) -> Option<usize>;

    /// Ordered legal actions for the acting player.
    ///
    /// Returns an empty vector at terminal and chance nodes.
    fn available_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Outcomes of a chance node together with their probabilities.
    ///
    /// Returns an empty vector at non-chance nodes.
    fn chance_outcomes(&self, state: &Self::State) -> Vec<(Self::Action, f64)>;

    /// Apply an action to a state and return the resulting new state.
    ///
    /// This should not modify the input state (immutable transition).
    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Information state of `player` at `state`.
    ///
    /// The engine only calls this for the acting player of a decision node.
    fn info_state(&self, state: &Self::State, player: usize) -> Self::InfoState;

    /// Utility of every player at a terminal state.
    ///
    /// # Panics
    /// May panic if called on a non-terminal state.
    fn returns(&self, state: &Self::State) -> Vec<f64>;

    /// Whether the utilities of every terminal state sum to zero.
    ///
    /// Exploitability is only defined when this holds for a two-player game.
    fn is_zero_sum(&self) -> bool {
        false
    }

    /// Get a human-readable name for an action.
    ///
    /// Used for debugging, visualization and to check that an information
    /// set keeps offering the same actions.
    fn action_name(&self, action: &Self::Action) -> String {
        action.to_string()
    }

    /// Get a human-readable description of a state.
    fn state_description(&self, state: &Self::State) -> String {
        format!("{:?}", state)
    }
}

/// Macro to simplify implementing the Action trait for simple enums.
#[macro_export]
macro_rules! impl_action {
    ($type:ty) => {
        impl $crate::cfr::game::Action for $type {
            fn to_string(&self) -> String {
                format!("{:?}", self)
            }
        }
    };
}

/// Macro to simplify implementing the GameState trait.
#[macro_export]
macro_rules! impl_game_state {
    ($type:ty) => {
        impl $crate::cfr::game::GameState for $type {}
    };
}
