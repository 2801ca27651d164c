//! Oracle-guided Monte Carlo Tree Search.
//!
//! This crate provides a PUCT search that works with any position implementing
//! `lilichest_core::Position`. An [`Oracle`] supplies a prior over the action
//! index space and a value for every leaf the search expands; the search
//! returns how often it visited each legal move at the root.
//!
//! # Features
//!
//! - **Generic**: Works with any `Position` implementation
//! - **PUCT Selection**: Uses the PUCT formula for move selection
//! - **Oracle Abstraction**: Uniform priors, random rollouts or a network
//! - **Repetition Damping**: Priors of moves that repeat a position on the
//!   current path are cut
//! - **Dirichlet Noise**: Optional exploration noise at the root node
//! - **Temperature Sampling**: Supports temperature-based move selection
//!
//! # Example
//!
//! ```
//! use lilichest_chess::ChessPosition;
//! use lilichest_mcts::{RolloutOracle, SearchConfig, SearchEngine};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let position = ChessPosition::starting();
//!
//! let config = SearchConfig::with_simulations(50);
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let oracle = RolloutOracle::new(rng.clone(), 20);
//! let mut engine = SearchEngine::new(config, oracle, rng);
//!
//! let result = engine.run(&position).unwrap();
//! println!("Best move: {:?}", result.best());
//! println!("Root value: {}", result.root_value);
//! ```

pub mod config;
mod node;
pub mod oracle;
pub mod search;
#[cfg(test)]
mod test_game;
mod tree;

pub use config::{RootNoise, SearchConfig};
pub use oracle::{Evaluation, Oracle, RolloutOracle, UniformOracle};
pub use search::{prior_distribution, SearchEngine, SearchResult};
