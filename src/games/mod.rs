//! Game implementations for the CFR-BR solver.
//!
//! These serve as:
//!
//! 1. **Validation**: Games with known Nash equilibria (like Kuhn Poker) verify
//!    that the solver and the evaluator are correct.
//!
//! 2. **Examples**: Demonstrate how to implement the `Game` trait for new games.
//!
//! 3. **Benchmarks**: Provide standardized games for performance testing.
//!
//! ## Available Games
//!
//! - [`kuhn`]: Kuhn Poker - 3 cards, one betting round, value -1/18 for player 0
//! - [`leduc`]: Leduc Hold'em - 6 cards, two betting rounds and a public card
//!
//! ## Adding New Games
//!
//! 1. Create a new module under `src/games/`
//! 2. Define state, action, and info state types
//! 3. Implement the `Game` trait, listing chance outcomes explicitly
//! 4. Add tests that verify expected behavior
//!
//! See the [`kuhn`] module for a complete example.

pub mod kuhn;
pub mod leduc;
