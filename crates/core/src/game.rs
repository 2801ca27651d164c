use std::fmt::Debug;
use std::hash::Hash;

use crate::{Outcome, Player, Result};

/// The capability set a board state must offer to be searched.
///
/// The search engine never looks inside a position: it only generates legal
/// moves, applies them, asks whether the game is over and fingerprints the
/// result. Any two-player, deterministic, perfect-information game can be
/// plugged in by implementing this trait.
pub trait Position: Clone {
    /// A move in the game (e.g., a chess move)
    type Move: Copy + Eq + Hash + Debug;

    /// Length of the oracle's dense move-probability vector
    const NUM_ACTIONS: usize;

    /// Returns all legal moves from this position
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Applies a move, returning an independent copy (immutable operation)
    fn apply_move(&self, mv: Self::Move) -> Self;

    /// Returns the player whose turn it is
    fn side_to_move(&self) -> Player;

    /// Returns the game outcome from the perspective of the side to move:
    /// - `Some(Outcome::Win)` if the side to move has won
    /// - `Some(Outcome::Loss)` if it has lost (e.g., it is checkmated)
    /// - `Some(Outcome::Draw)` for any other terminal cause
    /// - `None` if the game is not over
    fn outcome(&self) -> Option<Outcome>;

    /// Returns true if the game has ended
    fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// Fingerprint of the position, equal for equal placement, side to move
    /// and castling/en-passant state
    fn structural_hash(&self) -> u64;

    /// The last few moves that led to this position, oldest first
    fn recent_moves(&self) -> &[Self::Move];

    /// Maps a move to its slot in the oracle's vector, `None` if the move has
    /// no slot in the encoding scheme
    fn action_index(&self, mv: Self::Move) -> Option<usize>;

    /// Checks the structural sanity of the position.
    ///
    /// # Errors
    /// Returns `Error::InvalidPosition` for states the rules provider cannot
    /// search from.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
