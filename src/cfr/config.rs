//! Configuration options for the CFR-BR solver.
//!
//! This module provides configuration structs that control who best-responds
//! on each iteration and how regrets and strategy sums are accumulated.

use serde::{Deserialize, Serialize};

use crate::cfr::error::{Result, SolverError};

/// Which players best-respond on an iteration.
///
/// The best-responder's deterministic strategy is never added to the strategy
/// sums; only regret-matched strategies of the updating players are averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponderSchedule {
    /// Every player updates each iteration, each against the exact best
    /// responses of all the others to the current profile.
    #[default]
    Opponents,

    /// One responder per iteration, rotating `(t - 1) mod n`; the others update.
    Alternating,

    /// This player always responds and never learns; only the others update.
    ///
    /// The responder's strategy sums stay empty, so its average policy stays
    /// uniform. Only the other players' averages approach an equilibrium.
    Fixed(usize),
}

impl ResponderSchedule {
    /// Responding players on iteration `iteration` (1-based).
    pub fn responders(&self, iteration: u64, num_players: usize) -> Vec<usize> {
        match *self {
            ResponderSchedule::Opponents => (0..num_players).collect(),
            ResponderSchedule::Alternating => {
                vec![((iteration.saturating_sub(1)) % num_players as u64) as usize]
            }
            ResponderSchedule::Fixed(player) => vec![player],
        }
    }

    /// Players whose regrets are updated on iteration `iteration`.
    pub fn learners(&self, iteration: u64, num_players: usize) -> Vec<usize> {
        match *self {
            ResponderSchedule::Opponents => (0..num_players).collect(),
            _ => {
                let responders = self.responders(iteration, num_players);
                (0..num_players).filter(|p| !responders.contains(p)).collect()
            }
        }
    }
}

/// Configuration for the CFR-BR solver.
///
/// # Example
/// ```
/// use cfr_br::cfr::{CfrBrConfig, ResponderSchedule};
///
/// let config = CfrBrConfig::default();
/// assert_eq!(config.responder, ResponderSchedule::Opponents);
/// assert!(!config.use_cfr_plus);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfrBrConfig {
    /// Who best-responds each iteration.
    pub responder: ResponderSchedule,

    /// Floor cumulative regrets at zero after every iteration
    /// (regret-matching+).
    pub use_cfr_plus: bool,

    /// Weight iteration `t`'s strategy contribution by `t`.
    ///
    /// Later iterations then dominate the average strategy.
    pub use_linear_averaging: bool,
}

impl CfrBrConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the responder schedule.
    pub fn with_responder(mut self, responder: ResponderSchedule) -> Self {
        self.responder = responder;
        self
    }

    /// Builder method: set whether to use regret-matching+.
    pub fn with_cfr_plus(mut self, enable: bool) -> Self {
        self.use_cfr_plus = enable;
        self
    }

    /// Builder method: set whether to use linear averaging.
    pub fn with_linear_averaging(mut self, enable: bool) -> Self {
        self.use_linear_averaging = enable;
        self
    }

    /// Validate the configuration against a game's player count.
    pub fn validate(&self, num_players: usize) -> Result<()> {
        if num_players == 0 {
            return Err(SolverError::Config("game has no players".to_string()));
        }
        if let ResponderSchedule::Fixed(player) = self.responder {
            if player >= num_players {
                return Err(SolverError::Config(format!(
                    "fixed responder {} out of range for {} players",
                    player, num_players
                )));
            }
        }
        Ok(())
    }
}

/// Statistics tracked during training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of unique information sets discovered.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Most recent NashConv of the average policy (if calculated).
    pub nash_conv: Option<f64>,

    /// History of NashConv measurements.
    pub nash_conv_history: Vec<ConvergencePoint>,
}

/// A single NashConv measurement at a specific iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// Iteration number when this measurement was taken.
    pub iteration: u64,
    /// NashConv of the average policy.
    pub nash_conv: f64,
}

impl SolverStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record a NashConv measurement.
    pub fn record_nash_conv(&mut self, iteration: u64, nash_conv: f64) {
        self.nash_conv = Some(nash_conv);
        self.nash_conv_history.push(ConvergencePoint { iteration, nash_conv });
    }
}
