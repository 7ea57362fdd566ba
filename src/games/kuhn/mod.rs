//! Kuhn Poker implementation for CFR-BR validation.
//!
//! Kuhn Poker is a simplified poker game used to validate CFR implementations
//! because it has a known, mathematically proven Nash equilibrium.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack (0), Queen (1), King (2)
//! - 2 players, each antes 1 chip
//! - Chance deals one card to player 0, then one of the remaining two to
//!   player 1
//! - Player 0 acts first: Pass or Bet (1 chip)
//! - Player 1 responds based on player 0's action
//! - Higher card wins at showdown
//!
//! ## Game Tree
//!
//! ```text
//! P0 (first to act)
//! ├── Pass
//! │   └── P1
//! │       ├── Pass → Showdown (pot = 2)
//! │       └── Bet
//! │           └── P0
//! │               ├── Pass → P1 wins (pot = 3)
//! │               └── Bet → Showdown (pot = 4)
//! └── Bet
//!     └── P1
//!         ├── Pass → P0 wins (pot = 3)
//!         └── Bet → Showdown (pot = 4)
//! ```
//!
//! ## Known Nash Equilibrium
//!
//! A one-parameter family, `alpha` in `[0, 1/3]`:
//!
//! - **Player 0 with Jack**: Bet with probability α
//! - **Player 0 with Queen**: Always Pass; call a bet with probability α + 1/3
//! - **Player 0 with King**: Bet with probability 3α
//! - **Player 1 facing Bet with Jack**: Always Fold
//! - **Player 1 facing Bet with Queen**: Call with probability 1/3
//! - **Player 1 facing Bet with King**: Always Call
//!
//! **Expected Value**: Player 0 EV = -1/18 ≈ -0.0556

use std::fmt;

use crate::cfr::game::{Game, GameState, InfoState};
use crate::impl_action;

const CARD_NAMES: [&str; 3] = ["J", "Q", "K"];

/// Actions in Kuhn Poker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KuhnAction {
    /// Pass (check if no bet, fold if facing bet)
    Pass,
    /// Bet (or call if facing bet)
    Bet,
    /// Chance deals this card to the next player.
    Deal(u8),
}

impl_action!(KuhnAction);

/// Information state in Kuhn Poker.
///
/// What a player knows: their card and the action history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KuhnInfoState {
    /// Player's card (0=Jack, 1=Queen, 2=King)
    pub card: u8,
    /// Action history as string (e.g., "pb" = pass then bet)
    pub history: String,
}

impl InfoState for KuhnInfoState {
    fn key(&self) -> String {
        format!("{}:{}", self.card, self.history)
    }
}

impl fmt::Display for KuhnInfoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let card_name = CARD_NAMES.get(self.card as usize).copied().unwrap_or("?");
        write!(f, "{}|{}", card_name, self.history)
    }
}

/// Complete game state in Kuhn Poker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KuhnState {
    /// Cards dealt so far; `cards[0]` is player 0's.
    pub cards: Vec<u8>,
    /// Betting history as string
    pub history: String,
}

impl GameState for KuhnState {}

impl KuhnState {
    /// Chips player `player` has put in the pot, ante included.
    pub fn contribution(&self, player: usize) -> i32 {
        let bets = self
            .history
            .chars()
            .enumerate()
            .filter(|&(i, c)| c == 'b' && KuhnPoker::actor(i) == player)
            .count();
        1 + bets as i32
    }
}

impl fmt::Display for KuhnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<&str> = self.cards.iter().map(|&c| KuhnPoker::card_name(c)).collect();
        write!(f, "Cards:{:?} History:{}", cards, self.history)
    }
}

/// Kuhn Poker game.
#[derive(Debug, Clone, Default)]
pub struct KuhnPoker;

impl KuhnPoker {
    /// Create a new Kuhn Poker game.
    pub fn new() -> Self {
        Self
    }

    /// Get card name for display.
    pub fn card_name(card: u8) -> &'static str {
        match card {
            0 => "Jack",
            1 => "Queen",
            2 => "King",
            _ => "Unknown",
        }
    }

    /// Player making the `index`-th betting action.
    fn actor(index: usize) -> usize {
        index % 2
    }
}

impl Game for KuhnPoker {
    type State = KuhnState;
    type Action = KuhnAction;
    type InfoState = KuhnInfoState;

    fn initial_state(&self) -> Self::State {
        KuhnState::default()
    }

    fn num_players(&self) -> usize {
        2
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        // "pp" showdown, "pbp" fold, "pbb" call, "bp" fold, "bb" call
        matches!(state.history.as_str(), "pp" | "pbp" | "pbb" | "bp" | "bb")
    }

    fn is_chance(&self, state: &Self::State) -> bool {
        state.cards.len() < 2
    }

    fn current_player(&self, state: &Self::State) -> Option<usize> {
        if self.is_chance(state) || self.is_terminal(state) {
            return None;
        }
        Some(Self::actor(state.history.len()))
    }

    fn available_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.current_player(state).is_none() {
            return vec![];
        }
        vec![KuhnAction::Pass, KuhnAction::Bet]
    }

    fn chance_outcomes(&self, state: &Self::State) -> Vec<(Self::Action, f64)> {
        if !self.is_chance(state) {
            return vec![];
        }
        let remaining: Vec<u8> = (0..3).filter(|c| !state.cards.contains(c)).collect();
        let prob = 1.0 / remaining.len() as f64;
        remaining
            .into_iter()
            .map(|card| (KuhnAction::Deal(card), prob))
            .collect()
    }

    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        let mut new_state = state.clone();
        match action {
            KuhnAction::Pass => new_state.history.push('p'),
            KuhnAction::Bet => new_state.history.push('b'),
            KuhnAction::Deal(card) => new_state.cards.push(*card),
        }
        new_state
    }

    fn info_state(&self, state: &Self::State, player: usize) -> Self::InfoState {
        KuhnInfoState {
            card: state.cards[player],
            history: state.history.clone(),
        }
    }

    fn returns(&self, state: &Self::State) -> Vec<f64> {
        debug_assert!(self.is_terminal(state), "returns called on non-terminal state");

        let h = state.history.as_str();
        let p0_payoff = match h {
            // player 0 folded
            "pbp" => -f64::from(state.contribution(0)),
            // player 1 folded
            "bp" => f64::from(state.contribution(1)),
            _ => {
                let stake = f64::from(state.contribution(1));
                if state.cards[0] > state.cards[1] {
                    stake
                } else {
                    -stake
                }
            }
        };
        vec![p0_payoff, -p0_payoff]
    }

    fn is_zero_sum(&self) -> bool {
        true
    }

    fn state_description(&self, state: &Self::State) -> String {
        format!("{}", state)
    }
}
