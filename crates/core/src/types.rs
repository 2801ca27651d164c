//! Small domain types with enforced invariants.
//!
//! - Player: one of the two sides
//! - Outcome: terminal result relative to the side to move
//! - Value: game value in range [-1, 1]

use std::fmt;

/// One of the two sides of a two-player game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Get the opposing player.
    pub fn opponent(self) -> Self {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => write!(f, "first"),
            Player::Second => write!(f, "second"),
        }
    }
}

/// Result of a finished game, seen from the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Scalar value of the outcome: +1, -1 or 0.
    pub fn value(self) -> Value {
        match self {
            Outcome::Win => Value::WIN,
            Outcome::Loss => Value::LOSS,
            Outcome::Draw => Value::DRAW,
        }
    }

    /// The same result seen from the other side.
    pub fn flip(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

/// A game value estimate.
///
/// Invariant: Value is in range [-1, 1] where:
/// - +1 means the side to move is winning
/// - -1 means the side to move is losing
/// - 0 means a draw or equal position
///
/// # Example
/// ```
/// use lilichest_core::Value;
///
/// let value = Value::clamped(1.5);
/// assert_eq!(value, Value::WIN);
/// assert!(value.get() >= -1.0 && value.get() <= 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Value(f32);

impl Value {
    /// Value for a win.
    pub const WIN: Self = Self(1.0);

    /// Value for a loss.
    pub const LOSS: Self = Self(-1.0);

    /// Value for a draw.
    pub const DRAW: Self = Self(0.0);

    /// Create a value by clamping to [-1, 1].
    ///
    /// Evaluators are not required to stay inside the range, so their
    /// output goes through here before it reaches the tree.
    pub fn clamped(value: f32) -> Self {
        Self(value.clamp(-1.0, 1.0))
    }

    /// Get the underlying value.
    pub fn get(self) -> f32 {
        self.0
    }

    /// Negate the value (for opponent's perspective).
    pub fn negate(self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<Value> for f32 {
    fn from(v: Value) -> f32 {
        v.0
    }
}
