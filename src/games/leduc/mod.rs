//! Leduc Hold'em, a two-round poker game small enough for exact solving.
//!
//! ## Game Rules
//!
//! - 6 cards: two each of Jack, Queen, King (card `c` has rank `c / 2`)
//! - 2 players, each antes 1 chip
//! - Chance deals one private card to each player
//! - Round 1: fixed raise of 2 chips, at most 2 raises
//! - Chance deals one public card
//! - Round 2: fixed raise of 4 chips, at most 2 raises
//! - Player 0 opens both rounds; a call ends the round unless it is the
//!   round's first action (a check)
//! - Showdown: pairing the public card wins, otherwise the higher rank wins;
//!   equal ranks split the pot
//!
//! Fold is only offered when facing a raise. Legal actions are listed in the
//! order Fold, Call, Raise.

use std::fmt;

use crate::cfr::game::{Game, InfoState};
use crate::{impl_action, impl_game_state};

/// Number of cards in the deck.
pub const DECK_SIZE: u8 = 6;

/// Raise size per betting round.
pub const RAISE_SIZES: [i32; 2] = [2, 4];

/// Raises allowed per betting round.
pub const MAX_RAISES: usize = 2;

const RANK_NAMES: [&str; 3] = ["J", "Q", "K"];

/// Actions in Leduc poker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeducAction {
    /// Give up the pot; only legal when facing a raise.
    Fold,
    /// Match the outstanding bet (a check when there is none).
    Call,
    /// Call and add the round's raise size.
    Raise,
    /// Chance deals this card id.
    Deal(u8),
}

impl_action!(LeducAction);

impl LeducAction {
    fn symbol(&self) -> char {
        match self {
            LeducAction::Fold => 'f',
            LeducAction::Call => 'c',
            LeducAction::Raise => 'r',
            LeducAction::Deal(_) => 'd',
        }
    }
}

/// What one player sees: their own rank, the public rank once dealt and the
/// betting of both rounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeducInfoState {
    /// Rank of the private card (0=Jack, 1=Queen, 2=King).
    pub rank: u8,
    /// Rank of the public card, if dealt.
    pub public_rank: Option<u8>,
    /// Betting per round.
    pub history: [String; 2],
}

impl InfoState for LeducInfoState {
    fn key(&self) -> String {
        let public = self
            .public_rank
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        format!("{}{}:{}/{}", self.rank, public, self.history[0], self.history[1])
    }
}

impl fmt::Display for LeducInfoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = self.public_rank.map_or("?", rank_name);
        write!(
            f,
            "{}|{}|{}/{}",
            rank_name(self.rank),
            public,
            self.history[0],
            self.history[1]
        )
    }
}

/// Complete game state in Leduc poker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeducState {
    /// Private cards dealt so far; `cards[0]` is player 0's.
    pub cards: Vec<u8>,
    /// Public card, once dealt.
    pub public: Option<u8>,
    /// Current betting round (0 or 1).
    pub round: usize,
    /// Betting per round, one character per action.
    pub history: [String; 2],
    /// Chips each player has put in the pot.
    pub contributions: [i32; 2],
    /// Player who folded, if any.
    pub folded: Option<usize>,
}

impl_game_state!(LeducState);

impl Default for LeducState {
    fn default() -> Self {
        Self {
            cards: Vec::with_capacity(2),
            public: None,
            round: 0,
            history: [String::new(), String::new()],
            contributions: [1, 1],
            folded: None,
        }
    }
}

impl LeducState {
    fn raises(&self) -> usize {
        self.history[self.round].matches('r').count()
    }

    fn facing_raise(&self) -> bool {
        self.contributions[0] != self.contributions[1]
    }

    fn betting_closed(&self, round: usize) -> bool {
        let h = &self.history[round];
        h.len() > 1 && h.ends_with('c')
    }
}

impl fmt::Display for LeducState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<&str> = self.cards.iter().map(|&c| rank_name(c / 2)).collect();
        let public = self.public.map_or("?", |c| rank_name(c / 2));
        write!(
            f,
            "Cards:{:?} Public:{} History:{}/{} Pot:{:?}",
            cards, public, self.history[0], self.history[1], self.contributions
        )
    }
}

fn rank_name(rank: u8) -> &'static str {
    RANK_NAMES.get(rank as usize).copied().unwrap_or("?")
}

/// Leduc poker game.
#[derive(Debug, Clone, Default)]
pub struct LeducPoker;

impl LeducPoker {
    /// Create a new Leduc poker game.
    pub fn new() -> Self {
        Self
    }

    /// Showdown strength: pairs beat every unpaired hand.
    fn strength(card: u8, public: u8) -> u8 {
        let rank = card / 2;
        if rank == public / 2 {
            3 + rank
        } else {
            rank
        }
    }
}

impl Game for LeducPoker {
    type State = LeducState;
    type Action = LeducAction;
    type InfoState = LeducInfoState;

    fn initial_state(&self) -> Self::State {
        LeducState::default()
    }

    fn num_players(&self) -> usize {
        2
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.folded.is_some() || (state.round == 1 && state.betting_closed(1))
    }

    fn is_chance(&self, state: &Self::State) -> bool {
        state.folded.is_none()
            && (state.cards.len() < 2 || (state.round == 1 && state.public.is_none()))
    }

    fn current_player(&self, state: &Self::State) -> Option<usize> {
        if self.is_chance(state) || self.is_terminal(state) {
            return None;
        }
        Some(state.history[state.round].len() % 2)
    }

    fn available_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.current_player(state).is_none() {
            return vec![];
        }
        let mut actions = Vec::with_capacity(3);
        if state.facing_raise() {
            actions.push(LeducAction::Fold);
        }
        actions.push(LeducAction::Call);
        if state.raises() < MAX_RAISES {
            actions.push(LeducAction::Raise);
        }
        actions
    }

    fn chance_outcomes(&self, state: &Self::State) -> Vec<(Self::Action, f64)> {
        if !self.is_chance(state) {
            return vec![];
        }
        let remaining: Vec<u8> = (0..DECK_SIZE)
            .filter(|c| !state.cards.contains(c))
            .collect();
        let prob = 1.0 / remaining.len() as f64;
        remaining
            .into_iter()
            .map(|card| (LeducAction::Deal(card), prob))
            .collect()
    }

    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        let mut next = state.clone();
        if let LeducAction::Deal(card) = *action {
            if next.cards.len() < 2 {
                next.cards.push(card);
            } else {
                next.public = Some(card);
            }
            return next;
        }

        let player = next.history[next.round].len() % 2;
        let outstanding = next.contributions[0].max(next.contributions[1]);
        match action {
            LeducAction::Fold => next.folded = Some(player),
            LeducAction::Call => next.contributions[player] = outstanding,
            LeducAction::Raise => {
                next.contributions[player] = outstanding + RAISE_SIZES[next.round]
            }
            LeducAction::Deal(_) => {}
        }
        next.history[next.round].push(action.symbol());

        if next.round == 0 && next.betting_closed(0) {
            next.round = 1;
        }
        next
    }

    fn info_state(&self, state: &Self::State, player: usize) -> Self::InfoState {
        LeducInfoState {
            rank: state.cards[player] / 2,
            public_rank: state.public.map(|c| c / 2),
            history: state.history.clone(),
        }
    }

    fn returns(&self, state: &Self::State) -> Vec<f64> {
        debug_assert!(self.is_terminal(state), "returns called on non-terminal state");

        if let Some(loser) = state.folded {
            let stake = f64::from(state.contributions[loser]);
            let mut values = vec![stake; 2];
            values[loser] = -stake;
            return values;
        }

        let public = state.public.unwrap_or_default();
        let s0 = Self::strength(state.cards[0], public);
        let s1 = Self::strength(state.cards[1], public);
        // both players have matched the last raise
        let stake = f64::from(state.contributions[0]);
        match s0.cmp(&s1) {
            std::cmp::Ordering::Greater => vec![stake, -stake],
            std::cmp::Ordering::Less => vec![-stake, stake],
            std::cmp::Ordering::Equal => vec![0.0, 0.0],
        }
    }

    fn is_zero_sum(&self) -> bool {
        true
    }

    fn state_description(&self, state: &Self::State) -> String {
        format!("{}", state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::LeducAction::{Call, Deal, Fold, Raise};
    use crate::cfr::game::Action;

    fn play(game: &LeducPoker, actions: &[LeducAction]) -> LeducState {
        actions
            .iter()
            .fold(game.initial_state(), |state, a| game.apply_action(&state, a))
    }

    #[test]
    fn deals_then_opens_betting() {
        let game = LeducPoker::new();
        let root = game.initial_state();
        assert!(game.is_chance(&root));
        assert_eq!(game.chance_outcomes(&root).len(), 6);

        let one = play(&game, &[Deal(0)]);
        let outcomes = game.chance_outcomes(&one);
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|&(_, p)| (p - 0.2).abs() < 1e-12));

        let dealt = play(&game, &[Deal(0), Deal(5)]);
        assert_eq!(game.current_player(&dealt), Some(0));
        assert_eq!(game.available_actions(&dealt), vec![Call, Raise]);
    }

    #[test]
    fn raise_caps_and_fold_availability() {
        let game = LeducPoker::new();
        let state = play(&game, &[Deal(0), Deal(2), Raise]);
        assert_eq!(game.current_player(&state), Some(1));
        assert_eq!(game.available_actions(&state), vec![Fold, Call, Raise]);

        let capped = game.apply_action(&state, &Raise);
        assert_eq!(game.available_actions(&capped), vec![Fold, Call]);
        assert_eq!(capped.contributions, [3, 5]);
    }

    #[test]
    fn check_check_moves_to_public_card() {
        let game = LeducPoker::new();
        let state = play(&game, &[Deal(0), Deal(2), Call]);
        assert_eq!(game.current_player(&state), Some(1));

        let state = game.apply_action(&state, &Call);
        assert_eq!(state.round, 1);
        assert!(game.is_chance(&state));
        // both private cards are out of the deck
        assert_eq!(game.chance_outcomes(&state).len(), 4);

        let state = game.apply_action(&state, &Deal(4));
        assert_eq!(game.current_player(&state), Some(0));
        assert_eq!(game.info_state(&state, 1).key(), "12:cc/");
    }

    #[test]
    fn fold_pays_the_folders_stake() {
        let game = LeducPoker::new();
        let state = play(&game, &[Deal(0), Deal(4), Raise, Fold]);
        assert!(game.is_terminal(&state));
        assert_eq!(game.returns(&state), vec![1.0, -1.0]);

        let state = play(&game, &[Deal(0), Deal(4), Raise, Raise, Fold]);
        assert_eq!(game.returns(&state), vec![-3.0, 3.0]);
    }

    #[test]
    fn pair_beats_high_card() {
        let game = LeducPoker::new();
        // J vs K, public J, raise-call in round two
        let state = play(
            &game,
            &[Deal(0), Deal(4), Call, Call, Deal(1), Raise, Call],
        );
        assert!(game.is_terminal(&state));
        assert_eq!(state.contributions, [5, 5]);
        assert_eq!(game.returns(&state), vec![5.0, -5.0]);
    }

    #[test]
    fn equal_ranks_split() {
        let game = LeducPoker::new();
        let state = play(&game, &[Deal(4), Deal(5), Raise, Call, Deal(0), Call, Call]);
        assert!(game.is_terminal(&state));
        assert_eq!(game.returns(&state), vec![0.0, 0.0]);
    }

    #[test]
    fn higher_rank_wins_without_pair() {
        let game = LeducPoker::new();
        let state = play(&game, &[Deal(2), Deal(5), Call, Call, Deal(0), Call, Call]);
        assert_eq!(game.returns(&state), vec![-1.0, 1.0]);
    }

    #[test]
    fn keys_hide_the_opponent_card() {
        let game = LeducPoker::new();
        let a = play(&game, &[Deal(0), Deal(2), Raise]);
        let b = play(&game, &[Deal(1), Deal(4), Raise]);
        // player 0 holds a Jack in both; only player 1's view differs
        assert_eq!(game.info_state(&a, 0).key(), game.info_state(&b, 0).key());
        assert_ne!(game.info_state(&a, 1).key(), game.info_state(&b, 1).key());
        assert_eq!(game.info_state(&a, 1).key(), "1-:r/");
        assert_eq!(game.info_state(&a, 1).to_string(), "Q|?|r/");
    }

    #[test]
    fn action_names_use_variant_names() {
        let game = LeducPoker::new();
        assert_eq!(game.action_name(&Fold), "Fold");
        assert_eq!(Raise.to_string(), "Raise");
        assert_eq!(Deal(3).to_string(), "Deal(3)");
    }
}
