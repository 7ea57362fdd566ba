//! End-to-end convergence of CFR-BR on Kuhn and Leduc poker.

use cfr_br::cfr::{
    exploitability, expected_returns, nash_conv, CfrBrConfig, CfrBrSolver, Game,
    ResponderSchedule, TabularPolicy,
};
use cfr_br::games::kuhn::KuhnPoker;
use cfr_br::games::leduc::LeducPoker;

/// Player 0's equilibrium value in Kuhn poker.
const KUHN_VALUE: f64 = -1.0 / 18.0;

fn train<G: Game>(game: G, config: CfrBrConfig, iterations: u64) -> CfrBrSolver<G> {
    let mut solver = CfrBrSolver::new(game, config).unwrap();
    for _ in 0..iterations {
        solver.evaluate_and_update_policy().unwrap();
    }
    solver
}

/// 300 iterations bring the average policy within 0.001 of the game value.
#[test]
fn kuhn_reaches_nash_value() {
    let solver = train(KuhnPoker::new(), CfrBrConfig::default(), 300);
    let game = solver.game();
    let average = solver.average_policy();

    let values = expected_returns(game, &game.initial_state(), &average, None).unwrap();
    assert_eq!(values.len(), 2);
    assert!(
        (values[0] - KUHN_VALUE).abs() < 1e-3,
        "player 0 value {} should be near {KUHN_VALUE}",
        values[0]
    );
    assert!((values[1] + KUHN_VALUE).abs() < 1e-3);

    let exploit = exploitability(game, &average).unwrap();
    assert!(exploit <= 0.05, "exploitability {exploit} should be <= 0.05");
}

/// Dominated choices vanish from the average policy.
#[test]
fn kuhn_strategy_properties() {
    let solver = train(KuhnPoker::new(), CfrBrConfig::default(), 300);

    // Jack facing a bet always folds
    let jack = solver.average_strategy("0:b").unwrap();
    assert!(jack[0] > 0.9, "Jack should fold to a bet, got {jack:?}");

    // King facing a bet always calls
    let king = solver.average_strategy("2:b").unwrap();
    assert!(king[1] > 0.9, "King should call a bet, got {king:?}");

    // Jack that checked and then faces a bet always folds
    let jack_after_check = solver.average_strategy("0:pb").unwrap();
    assert!(jack_after_check[0] > 0.9, "Jack should fold after check-bet, got {jack_after_check:?}");
}

#[test]
fn leduc_nash_conv_decreases() {
    let game = LeducPoker::new();
    let uniform = nash_conv(&game, &TabularPolicy::uniform(&game).unwrap()).unwrap();

    let mut solver = CfrBrSolver::new(game, CfrBrConfig::default()).unwrap();
    solver.train(10).unwrap();
    let early = solver.record_nash_conv().unwrap();
    solver.train(90).unwrap();
    let late = solver.record_nash_conv().unwrap();

    println!("Iters 100, nash_conv = {late}");
    assert!(late.is_finite());
    assert!(late >= 0.0);
    assert!(early < uniform, "{early} >= {uniform}");
    assert!(late < early, "nash_conv after 100 iterations {late} >= after 10 {early}");
}

#[test]
fn every_schedule_improves_on_uniform() {
    let game = KuhnPoker::new();
    let uniform = nash_conv(&game, &TabularPolicy::uniform(&game).unwrap()).unwrap();

    let configs = [
        CfrBrConfig::new().with_responder(ResponderSchedule::Alternating),
        CfrBrConfig::new().with_cfr_plus(true).with_linear_averaging(true),
        CfrBrConfig::new()
            .with_responder(ResponderSchedule::Alternating)
            .with_cfr_plus(true),
    ];
    for config in configs {
        let solver = train(game.clone(), config.clone(), 200);
        let value = nash_conv(&game, &solver.average_policy()).unwrap();
        assert!(value < uniform / 4.0, "{config:?}: nash_conv {value}");
    }
}

#[test]
fn identical_runs_produce_identical_policies() {
    let a = train(LeducPoker::new(), CfrBrConfig::default(), 5);
    let b = train(LeducPoker::new(), CfrBrConfig::default(), 5);

    assert_eq!(a.average_policy(), b.average_policy());
    assert_eq!(
        a.average_policy().to_json().unwrap(),
        b.average_policy().to_json().unwrap()
    );
}

#[test]
fn average_policy_survives_json() {
    let solver = train(KuhnPoker::new(), CfrBrConfig::default(), 50);
    let game = solver.game();
    let average = solver.average_policy();

    let restored = TabularPolicy::from_json(&average.to_json().unwrap()).unwrap();
    let before = nash_conv(game, &average).unwrap();
    let after = nash_conv(game, &restored).unwrap();
    assert!((before - after).abs() < 1e-12);
}
