//! Lilichest Core - capability traits and common types
//!
//! This crate provides the [`Position`] trait that describes what a board
//! state must offer to be searched, and the small value types shared by the
//! rules adapter, the search engine and the oracles.
//!
//! # Types
//!
//! - [`Position`] - Trait for searchable board states
//! - [`Player`] - The two sides of the game
//! - [`Outcome`] - Terminal result from the side to move's perspective
//! - [`Value`] - Game value estimate in [-1, 1]

mod error;
mod game;
mod types;

pub use error::{Error, EvaluationError, Result};
pub use game::Position;
pub use types::{Outcome, Player, Value};
