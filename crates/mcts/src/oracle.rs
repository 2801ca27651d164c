//! Evaluation abstraction for the search.
//!
//! An [`Oracle`] looks at a position and returns a prior over the fixed
//! action index space plus a scalar value. The search never trusts the
//! output blindly: [`Evaluation::check`] rejects malformed answers, and the
//! search turns those into retries.
//!
//! Implementations:
//! - [`UniformOracle`]: flat priors, value 0. Useful as a baseline.
//! - [`RolloutOracle`]: uniform priors over legal moves, random playout value.
//! - An ONNX network lives in the `lilichest-inference` crate.

use lilichest_core::{EvaluationError, Position};
use rand::Rng;
use std::cell::RefCell;

/// Evaluation result: prior policy + value estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Prior probability for each action index.
    /// Length must equal `P::NUM_ACTIONS`.
    pub policy: Vec<f32>,

    /// Value estimate from the perspective of the side to move.
    /// Expected in [-1, 1]; out-of-range finite values are clamped.
    pub value: f32,
}

impl Evaluation {
    /// Reject outputs the search cannot use.
    pub fn check(&self, num_actions: usize) -> Result<(), EvaluationError> {
        if self.policy.len() != num_actions {
            return Err(EvaluationError::ShapeMismatch {
                expected: num_actions,
                actual: self.policy.len(),
            });
        }
        if !self.value.is_finite() {
            return Err(EvaluationError::NonFiniteValue(self.value));
        }
        Ok(())
    }
}

/// Trait for evaluating positions.
///
/// The search calls this once per expanded node. Implementations may keep
/// mutable state behind interior mutability (an RNG, an inference session)
/// because a single search only ever evaluates from one thread.
pub trait Oracle<P: Position> {
    /// Evaluate a position, returning prior policy and value estimate.
    ///
    /// `recent_moves` holds the last moves that led to `position`, oldest
    /// first, for oracles whose input encodes move history.
    fn evaluate(
        &self,
        position: &P,
        recent_moves: &[P::Move],
    ) -> Result<Evaluation, EvaluationError>;
}

impl<P: Position, O: Oracle<P> + ?Sized> Oracle<P> for &O {
    fn evaluate(
        &self,
        position: &P,
        recent_moves: &[P::Move],
    ) -> Result<Evaluation, EvaluationError> {
        (**self).evaluate(position, recent_moves)
    }
}

impl<P: Position, O: Oracle<P> + ?Sized> Oracle<P> for Box<O> {
    fn evaluate(
        &self,
        position: &P,
        recent_moves: &[P::Move],
    ) -> Result<Evaluation, EvaluationError> {
        (**self).evaluate(position, recent_moves)
    }
}

/// Oracle with a flat prior over every index and a neutral value.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformOracle;

impl<P: Position> Oracle<P> for UniformOracle {
    fn evaluate(&self, _position: &P, _recent: &[P::Move]) -> Result<Evaluation, EvaluationError> {
        Ok(Evaluation {
            policy: vec![1.0 / P::NUM_ACTIONS as f32; P::NUM_ACTIONS],
            value: 0.0,
        })
    }
}

/// Oracle using uniform prior and random rollouts.
///
/// - Policy: uniform distribution over legal moves
/// - Value: result of a random playout from the position
pub struct RolloutOracle<R: Rng> {
    /// Random number generator (wrapped in RefCell for interior mutability).
    rng: RefCell<R>,

    /// Maximum plies in a random playout.
    max_rollout_depth: usize,
}

impl<R: Rng> RolloutOracle<R> {
    /// Create a new rollout oracle.
    ///
    /// # Arguments
    /// * `rng` - Random number generator for rollouts
    /// * `max_rollout_depth` - Maximum moves in a random playout
    pub fn new(rng: R, max_rollout_depth: usize) -> Self {
        Self {
            rng: RefCell::new(rng),
            max_rollout_depth,
        }
    }

    /// Play random moves from `start` and score the final position from the
    /// perspective of the side to move at `start`. Unfinished playouts score 0.
    fn rollout<P: Position>(&self, start: &P) -> f32 {
        let side = start.side_to_move();
        let mut position = start.clone();

        for _ in 0..self.max_rollout_depth {
            if position.is_terminal() {
                break;
            }
            let moves = position.legal_moves();
            if moves.is_empty() {
                break;
            }
            let idx = self.rng.borrow_mut().gen_range(0..moves.len());
            position = position.apply_move(moves[idx]);
        }

        match position.outcome() {
            Some(outcome) if position.side_to_move() == side => outcome.value().get(),
            Some(outcome) => outcome.flip().value().get(),
            None => 0.0,
        }
    }
}

impl<P: Position, R: Rng> Oracle<P> for RolloutOracle<R> {
    fn evaluate(&self, position: &P, _recent: &[P::Move]) -> Result<Evaluation, EvaluationError> {
        let legal = position.legal_moves();

        // Uniform prior over legal moves
        let mut policy = vec![0.0; P::NUM_ACTIONS];
        if !legal.is_empty() {
            let prior = 1.0 / legal.len() as f32;
            for &mv in &legal {
                if let Some(slot) = position.action_index(mv).and_then(|i| policy.get_mut(i)) {
                    *slot = prior;
                }
            }
        }

        Ok(Evaluation {
            policy,
            value: self.rollout(position),
        })
    }
}
