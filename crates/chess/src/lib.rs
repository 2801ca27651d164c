//! Lilichest Chess - chess positions for oracle-guided search
//!
//! The rules themselves (move generation, check detection, Zobrist hashing)
//! come from the `chess` crate. This crate adapts them to the
//! [`lilichest_core::Position`] capability set and owns the two encodings
//! shared with the evaluator:
//!
//! - [`MoveIndex`] - the 4672-slot move encoding of the policy vector
//! - [`features`] - the 22-plane input tensor

pub mod features;
pub mod move_index;
mod position;
pub mod uci;

pub use chess::{ChessMove, Color, Piece, Square};
pub use move_index::{MoveClass, MoveIndex, NUM_PLANES, POLICY_SIZE};
pub use position::{player_of, ChessPosition, Termination, HISTORY_LEN, STARTING_FEN};
