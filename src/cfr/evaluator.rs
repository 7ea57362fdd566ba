//! Policy evaluation: expected returns, NashConv and exploitability.
//!
//! NashConv is the sum over players of what each could gain by switching to
//! a best response; exploitability is its per-player average in two-player
//! zero-sum games.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cfr::best_response::{check_player, BestResponse};
use crate::cfr::error::{Result, SolverError};
use crate::cfr::game::{Game, InfoState};
use crate::cfr::policy::{tree_profile, Policy};
use crate::cfr::tree::GameTree;

/// Largest tolerated `|v0 + v1|` for a zero-sum policy value.
pub const ZERO_SUM_TOLERANCE: f64 = 1e-6;

/// Expected utility of every player when all of them follow `policy` from
/// `state`.
///
/// With `player_filter = Some(p)` only player `p`'s entry is reported; the
/// other entries are left at zero.
pub fn expected_returns<G, P>(
    game: &G,
    state: &G::State,
    policy: &P,
    player_filter: Option<usize>,
) -> Result<Vec<f64>>
where
    G: Game,
    P: Policy + ?Sized,
{
    if let Some(player) = player_filter {
        check_player(game, player)?;
    }

    let mut values = policy_value(game, state, policy)?;
    if let Some(player) = player_filter {
        for (p, v) in values.iter_mut().enumerate() {
            if p != player {
                *v = 0.0;
            }
        }
    }
    Ok(values)
}

fn policy_value<G, P>(game: &G, state: &G::State, policy: &P) -> Result<Vec<f64>>
where
    G: Game,
    P: Policy + ?Sized,
{
    let num_players = game.num_players();

    if game.is_terminal(state) {
        let returns = game.returns(state);
        if returns.len() != num_players {
            return Err(SolverError::ReturnsLength {
                expected: num_players,
                found: returns.len(),
            });
        }
        return Ok(returns);
    }

    let mut expected = vec![0.0; num_players];

    if game.is_chance(state) {
        for (outcome, prob) in game.chance_outcomes(state) {
            let child = policy_value(game, &game.apply_action(state, &outcome), policy)?;
            accumulate(&mut expected, prob, &child);
        }
        return Ok(expected);
    }

    let player = game.current_player(state).ok_or_else(|| {
        SolverError::InvalidState(format!("no acting player at {}", game.state_description(state)))
    })?;
    let key = game.info_state(state, player).key();
    let actions = game.available_actions(state);
    if actions.is_empty() {
        return Err(SolverError::NoLegalActions { key });
    }
    let probs = policy
        .probabilities(&key)
        .ok_or_else(|| SolverError::MissingPolicy { key: key.clone() })?;
    if probs.len() != actions.len() {
        return Err(SolverError::PolicyLength {
            key,
            expected: actions.len(),
            found: probs.len(),
        });
    }

    for (action, &prob) in actions.iter().zip(probs) {
        if prob == 0.0 {
            continue;
        }
        let child = policy_value(game, &game.apply_action(state, action), policy)?;
        accumulate(&mut expected, prob, &child);
    }
    Ok(expected)
}

fn accumulate(total: &mut [f64], weight: f64, value: &[f64]) {
    for (t, v) in total.iter_mut().zip(value) {
        *t += weight * v;
    }
}

/// Per-player breakdown behind a NashConv number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NashConvReport {
    /// Sum of `improvements`.
    pub nash_conv: f64,
    /// Expected returns of each player under the evaluated policy.
    pub on_policy_values: Vec<f64>,
    /// Value each player gets by best-responding to the others.
    pub best_response_values: Vec<f64>,
    /// `best_response_values - on_policy_values`, per player.
    pub improvements: Vec<f64>,
}

/// NashConv of `policy` with its per-player breakdown.
///
/// Best responses of different players are independent and are computed in
/// parallel.
pub fn nash_conv_report<G, P>(game: &G, policy: &P) -> Result<NashConvReport>
where
    G: Game,
    P: Policy + ?Sized,
{
    let tree = GameTree::build(game)?;
    let profile = tree_profile(&tree, policy, None)?;
    let on_policy_values = expected_returns(game, &game.initial_state(), policy, None)?;

    let best_response_values: Vec<f64> = (0..game.num_players())
        .into_par_iter()
        .map(|player| BestResponse::compute(&tree, player, &profile).value()[player])
        .collect();

    let improvements: Vec<f64> = best_response_values
        .iter()
        .zip(&on_policy_values)
        .map(|(br, on)| br - on)
        .collect();
    let nash_conv = improvements.iter().sum();

    log::debug!("nash_conv = {nash_conv:.6}, improvements = {improvements:?}");

    Ok(NashConvReport {
        nash_conv,
        on_policy_values,
        best_response_values,
        improvements,
    })
}

/// Sum over players of the gain from deviating to a best response.
///
/// Non-negative for every policy; zero exactly at a Nash equilibrium.
pub fn nash_conv<G, P>(game: &G, policy: &P) -> Result<f64>
where
    G: Game,
    P: Policy + ?Sized,
{
    Ok(nash_conv_report(game, policy)?.nash_conv)
}

/// Average over both players of the gain from deviating to a best response.
///
/// Only defined for two-player zero-sum games, and only when the policy's own
/// value is zero-sum.
pub fn exploitability<G, P>(game: &G, policy: &P) -> Result<f64>
where
    G: Game,
    P: Policy + ?Sized,
{
    if game.num_players() != 2 || !game.is_zero_sum() {
        return Err(SolverError::NotTwoPlayerZeroSum);
    }

    let report = nash_conv_report(game, policy)?;
    let values = &report.on_policy_values;
    if (values[0] + values[1]).abs() > ZERO_SUM_TOLERANCE {
        return Err(SolverError::NotZeroSumValue { values: values.clone() });
    }

    Ok(report.improvements.iter().sum::<f64>() / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::policy::{PolicyEntry, TabularPolicy};
    use crate::cfr::testing::{CoinGame, Fault};
    use crate::games::kuhn::KuhnPoker;
    use crate::games::leduc::LeducPoker;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Kuhn equilibrium with alpha = 0 (player 0 never bluffs).
    fn kuhn_equilibrium() -> TabularPolicy {
        let rows: [(&str, usize, f64); 12] = [
            ("0:", 0, 0.0),
            ("1:", 0, 0.0),
            ("2:", 0, 0.0),
            ("0:pb", 0, 0.0),
            ("1:pb", 0, 1.0 / 3.0),
            ("2:pb", 0, 1.0),
            ("0:p", 1, 1.0 / 3.0),
            ("1:p", 1, 0.0),
            ("2:p", 1, 1.0),
            ("0:b", 1, 0.0),
            ("1:b", 1, 1.0 / 3.0),
            ("2:b", 1, 1.0),
        ];
        let mut policy = TabularPolicy::new();
        for (key, player, bet) in rows {
            policy.insert(PolicyEntry {
                key: key.to_string(),
                player,
                actions: vec!["Pass".into(), "Bet".into()],
                probs: vec![1.0 - bet, bet],
            });
        }
        policy
    }

    #[test]
    fn uniform_kuhn_returns() {
        let game = KuhnPoker::new();
        let uniform = TabularPolicy::uniform(&game).unwrap();
        let values = expected_returns(&game, &game.initial_state(), &uniform, None).unwrap();
        assert!((values[0] - 0.125).abs() < 1e-12);
        assert!((values[1] + 0.125).abs() < 1e-12);

        let filtered = expected_returns(&game, &game.initial_state(), &uniform, Some(1)).unwrap();
        assert_eq!(filtered[0], 0.0);
        assert!((filtered[1] + 0.125).abs() < 1e-12);
    }

    #[test]
    fn uniform_kuhn_nash_conv() {
        let game = KuhnPoker::new();
        let uniform = TabularPolicy::uniform(&game).unwrap();
        let report = nash_conv_report(&game, &uniform).unwrap();

        // best responses: 1/2 and 5/12; on-policy: 1/8 and -1/8
        let expected = (0.5 - 0.125) + (5.0 / 12.0 + 0.125);
        assert!((report.nash_conv - expected).abs() < 1e-9, "{report:?}");
        assert!((exploitability(&game, &uniform).unwrap() - expected / 2.0).abs() < 1e-9);
    }

    #[test]
    fn equilibrium_has_zero_nash_conv() {
        let game = KuhnPoker::new();
        let policy = kuhn_equilibrium();

        let values = expected_returns(&game, &game.initial_state(), &policy, None).unwrap();
        assert!((values[0] + 1.0 / 18.0).abs() < 1e-9, "{values:?}");
        assert!(nash_conv(&game, &policy).unwrap().abs() < 1e-9);
    }

    #[test]
    fn nash_conv_is_non_negative_for_random_policies() {
        let game = LeducPoker::new();
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..3 {
            let policy = TabularPolicy::random(&game, &mut rng).unwrap();
            let report = nash_conv_report(&game, &policy).unwrap();
            assert!(report.improvements.iter().all(|&i| i >= -1e-9), "{report:?}");
            assert!(report.nash_conv > 0.0);
        }
    }

    #[test]
    fn exploitability_needs_a_zero_sum_game() {
        // zero-sum payoffs, but the game does not declare itself zero-sum
        let game = CoinGame::new(Fault::None);
        let uniform = TabularPolicy::uniform(&game).unwrap();
        assert_eq!(exploitability(&game, &uniform), Err(SolverError::NotTwoPlayerZeroSum));

        // NashConv has no such restriction; a fair coin leaves nothing to exploit
        assert!(nash_conv(&game, &uniform).unwrap().abs() < 1e-12);
    }

    #[test]
    fn malformed_games_fail_evaluation() {
        let game = CoinGame::new(Fault::None);
        let uniform = TabularPolicy::uniform(&game).unwrap();
        game.set_fault(Fault::ShortReturns);
        let err = expected_returns(&game, &game.initial_state(), &uniform, None).unwrap_err();
        assert!(matches!(err, SolverError::ReturnsLength { expected: 2, found: 1 }));

        game.set_fault(Fault::NoActions);
        let err = nash_conv(&game, &uniform).unwrap_err();
        assert!(matches!(err, SolverError::NoLegalActions { .. }));
    }

    #[test]
    fn policy_errors_surface() {
        let game = KuhnPoker::new();
        let empty = TabularPolicy::new();
        assert!(empty.is_empty());
        let err = expected_returns(&game, &game.initial_state(), &empty, None).unwrap_err();
        assert!(matches!(err, SolverError::MissingPolicy { .. }));

        let mut short = TabularPolicy::uniform(&game).unwrap();
        short.insert(PolicyEntry {
            key: "0:".into(),
            player: 0,
            actions: vec!["Pass".into()],
            probs: vec![1.0],
        });
        let err = nash_conv(&game, &short).unwrap_err();
        assert!(matches!(err, SolverError::PolicyLength { expected: 2, found: 1, .. }));

        let uniform = TabularPolicy::uniform(&game).unwrap();
        let err = expected_returns(&game, &game.initial_state(), &uniform, Some(5)).unwrap_err();
        assert!(matches!(err, SolverError::InvalidPlayer { .. }));
    }
}
