//! A tiny configurable game for exercising precondition checks.
//!
//! Chance flips a coin (seen by player 0 only), player 0 picks one of two
//! moves, player 1 answers after seeing the move, and the parity of the three
//! choices decides who wins one chip. Each [`Fault`] breaks one rule of the
//! `Game` contract.

use std::sync::{Arc, RwLock};

use crate::cfr::game::{Game, InfoState};
use crate::{impl_action, impl_game_state};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Move(pub u8);

impl_action!(Move);

#[derive(Debug, Clone, Default)]
pub(crate) struct Line(Vec<u8>);

impl_game_state!(Line);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Key(String);

impl InfoState for Key {
    fn key(&self) -> String {
        self.0.clone()
    }
}

/// Which rule of the contract the game breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    None,
    /// Player 0 has no legal move.
    NoActions,
    /// The coin's probabilities sum to 0.9.
    BadChance,
    /// Terminal returns carry one entry for two players.
    ShortReturns,
    /// After the second coin face, player 1's key offers three moves.
    ChangedActions,
    /// After the second coin face, player 0 acts at player 1's key.
    SharedKey,
}

/// Clones share the fault, so a test can break a game a solver already owns.
#[derive(Debug, Clone)]
pub(crate) struct CoinGame {
    fault: Arc<RwLock<Fault>>,
}

impl CoinGame {
    pub(crate) fn new(fault: Fault) -> Self {
        Self {
            fault: Arc::new(RwLock::new(fault)),
        }
    }

    pub(crate) fn set_fault(&self, fault: Fault) {
        *self.fault.write().unwrap() = fault;
    }

    fn fault(&self) -> Fault {
        *self.fault.read().unwrap()
    }

    fn second_face(state: &Line) -> bool {
        state.0.first() == Some(&1)
    }
}

impl Game for CoinGame {
    type State = Line;
    type Action = Move;
    type InfoState = Key;

    fn initial_state(&self) -> Line {
        Line::default()
    }

    fn num_players(&self) -> usize {
        2
    }

    fn is_terminal(&self, state: &Line) -> bool {
        state.0.len() == 3
    }

    fn is_chance(&self, state: &Line) -> bool {
        state.0.is_empty()
    }

    fn current_player(&self, state: &Line) -> Option<usize> {
        match state.0.len() {
            1 => Some(0),
            2 if self.fault() == Fault::SharedKey && Self::second_face(state) => Some(0),
            2 => Some(1),
            _ => None,
        }
    }

    fn available_actions(&self, state: &Line) -> Vec<Move> {
        match (state.0.len(), self.fault()) {
            (1, Fault::NoActions) => vec![],
            (2, Fault::ChangedActions) if Self::second_face(state) => {
                vec![Move(0), Move(1), Move(2)]
            }
            (1, _) | (2, _) => vec![Move(0), Move(1)],
            _ => vec![],
        }
    }

    fn chance_outcomes(&self, state: &Line) -> Vec<(Move, f64)> {
        if !self.is_chance(state) {
            return vec![];
        }
        let tails = if self.fault() == Fault::BadChance { 0.4 } else { 0.5 };
        vec![(Move(0), 0.5), (Move(1), tails)]
    }

    fn apply_action(&self, state: &Line, action: &Move) -> Line {
        let mut next = state.clone();
        next.0.push(action.0);
        next
    }

    fn info_state(&self, state: &Line, player: usize) -> Key {
        if player == 0 && state.0.len() == 1 {
            Key(format!("coin:{}", state.0[0]))
        } else {
            Key(format!("answer:{}", state.0[1]))
        }
    }

    fn returns(&self, state: &Line) -> Vec<f64> {
        let sum: u8 = state.0.iter().sum();
        let value = if sum % 2 == 0 { 1.0 } else { -1.0 };
        if self.fault() == Fault::ShortReturns {
            vec![value]
        } else {
            vec![value, -value]
        }
    }
}
