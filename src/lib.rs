//! # CFR-BR
//!
//! Counterfactual Regret Minimization against a Best Response for computing
//! approximate Nash equilibria of finite extensive-form games.
//!
//! ## Features
//!
//! - **Generic Engine**: Works with any game implementing the `Game` trait
//! - **Exact Best Responses**: Backward induction over the full game tree
//! - **Evaluation**: Expected returns, NashConv and exploitability
//! - **Checkpointing**: Save and resume solver state
//!
//! ## Quick Start
//!
//! ```ignore
//! use cfr_br::cfr::{CfrBrConfig, CfrBrSolver};
//! use cfr_br::games::leduc::LeducPoker;
//!
//! let mut solver = CfrBrSolver::new(LeducPoker::new(), CfrBrConfig::default())?;
//! solver.train(100)?;
//! let nash_conv = solver.record_nash_conv()?;
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Solver, best response and evaluation
//! - [`games`]: Kuhn and Leduc poker
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     CFR-BR Solver (Generic)                     │
//! │  - Regret matching        - Exact best responses                │
//! │  - Regret accumulation    - NashConv / exploitability           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements Game trait
//!                               ▼
//!                  ┌────────────┴────────────┐
//!                  │                         │
//!                  ▼                         ▼
//!             ┌─────────┐              ┌──────────┐
//!             │  Kuhn   │              │  Leduc   │
//!             │  Poker  │              │  Poker   │
//!             └─────────┘              └──────────┘
//! ```

#![warn(missing_docs)]

/// CFR-BR solver module.
///
/// This is the core module containing the generic algorithms.
pub mod cfr;

/// Game implementations module.
///
/// Contains small poker games with known properties for testing and validation.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{CfrBrConfig, CfrBrSolver, Game, Policy, SolverError, TabularPolicy};
