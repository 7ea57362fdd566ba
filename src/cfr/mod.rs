//! CFR-BR (Counterfactual Regret Minimization against a Best Response).
//!
//! This module provides a generic CFR-BR solver for finite two-or-more
//! player extensive-form games, together with the exact evaluation tools it
//! depends on.
//!
//! # Overview
//!
//! Each CFR-BR iteration:
//! 1. Derives every player's current strategy from cumulative regrets
//!    (regret matching)
//! 2. Computes exact best responses to that profile by backward induction
//! 3. Updates each learner's regrets and strategy sums with the opponents
//!    replaced by their best responses
//!
//! The average of the learners' strategies converges to a Nash equilibrium
//! in two-player zero-sum games.
//!
//! # Variants
//!
//! - **Responder schedule**: all opponents, one alternating responder, or a
//!   fixed responder (see [`ResponderSchedule`])
//! - **CFR+**: Floors negative regrets to zero
//! - **Linear averaging**: Weights later iterations more heavily
//!
//! # Usage
//!
//! 1. Implement the `Game` trait for your game
//! 2. Create a `CfrBrSolver` with your game and configuration
//! 3. Call `evaluate_and_update_policy()` or `train()` to run iterations
//! 4. Extract the equilibrium approximation with `average_policy()`
//! 5. Measure it with [`nash_conv`] or [`exploitability`]
//!
//! # Example
//!
//! ```ignore
//! use cfr_br::cfr::{exploitability, CfrBrConfig, CfrBrSolver};
//! use cfr_br::games::kuhn::KuhnPoker;
//!
//! let mut solver = CfrBrSolver::new(KuhnPoker::new(), CfrBrConfig::default())?;
//! solver.train(300)?;
//!
//! let average = solver.average_policy();
//! println!("exploitability = {:.4}", exploitability(solver.game(), &average)?);
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value
//! of the current strategy, weighted by the counterfactual reach.
//! ```text
//! Regret(I, a) += reach_-p(I) * (Value(I, a) - Value(I))
//! ```
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Johanson, M., et al. "Finding Optimal Abstract Strategies in Extensive-Form Games" (2012)
//! - Tammelin, O. "Solving Large Imperfect Information Games Using CFR+" (2014)

pub mod best_response;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod game;
pub mod policy;
pub mod solver;
pub mod storage;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenient access
pub use best_response::{best_response, best_response_value, BestResponse, BestResponsePolicy};
pub use config::{CfrBrConfig, ConvergencePoint, ResponderSchedule, SolverStats};
pub use error::{Result, SolverError};
pub use evaluator::{exploitability, expected_returns, nash_conv, nash_conv_report, NashConvReport};
pub use game::{Action, Game, GameState, InfoState};
pub use policy::{Policy, PolicyEntry, TabularPolicy};
pub use solver::{CfrBrSolver, SolverState};
pub use storage::{regret_match, InfoSetNode, RegretStorage, StorageExport};
pub use tree::GameTree;
