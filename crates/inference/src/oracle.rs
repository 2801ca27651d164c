//! Neural network oracle implementing the search's `Oracle` trait.

use crate::model::{ModelOutput, OnnxModel};
use lilichest_chess::{features, ChessMove, ChessPosition, POLICY_SIZE};
use lilichest_core::{EvaluationError, Position};
use lilichest_mcts::{Evaluation, Oracle};
use std::path::Path;

/// Oracle backed by an ONNX policy/value network.
///
/// The network sees the 22 feature planes of the position, which already
/// carry the last two moves, so the `recent_moves` argument is not read.
pub struct OnnxOracle {
    model: OnnxModel,
}

impl OnnxOracle {
    /// Load the network from an `.onnx` file.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self {
            model: OnnxModel::load(path)?,
        })
    }
}

impl Oracle<ChessPosition> for OnnxOracle {
    fn evaluate(
        &self,
        position: &ChessPosition,
        _recent_moves: &[ChessMove],
    ) -> Result<Evaluation, EvaluationError> {
        check_position(position)?;
        let features = features::encode(position);
        let output = self
            .model
            .infer(&features)
            .map_err(|e| EvaluationError::Backend(format!("{:#}", e)))?;
        into_evaluation(output)
    }
}

/// Reject positions the network has nothing to score: boards that fail the
/// rules crate's sanity checks, and positions without a legal move.
fn check_position(position: &ChessPosition) -> Result<(), EvaluationError> {
    position
        .validate()
        .map_err(|e| EvaluationError::MalformedPosition(e.to_string()))?;
    if position.legal().is_empty() {
        return Err(EvaluationError::MalformedPosition(format!(
            "no legal moves in {}",
            position.fen()
        )));
    }
    Ok(())
}

/// Check the raw network output against the move index and wrap it.
fn into_evaluation(output: ModelOutput) -> Result<Evaluation, EvaluationError> {
    let evaluation = Evaluation {
        policy: output.policy,
        value: output.value,
    };
    evaluation.check(POLICY_SIZE)?;
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_position_accepts_playable_positions() {
        assert_eq!(check_position(&ChessPosition::starting()), Ok(()));
    }

    #[test]
    fn test_check_position_rejects_finished_games() {
        // Fool's mate, white to move and mated
        let mated = ChessPosition::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert!(matches!(
            check_position(&mated),
            Err(EvaluationError::MalformedPosition(msg)) if msg.contains("no legal moves")
        ));
    }

    #[test]
    fn test_well_formed_output() {
        let output = ModelOutput {
            policy: vec![1.0 / POLICY_SIZE as f32; POLICY_SIZE],
            value: 0.25,
        };
        let evaluation = into_evaluation(output).unwrap();
        assert_eq!(evaluation.policy.len(), POLICY_SIZE);
        assert_eq!(evaluation.value, 0.25);
    }

    #[test]
    fn test_wrong_policy_length() {
        let output = ModelOutput {
            policy: vec![0.0; 1858],
            value: 0.0,
        };
        assert_eq!(
            into_evaluation(output).unwrap_err(),
            EvaluationError::ShapeMismatch {
                expected: POLICY_SIZE,
                actual: 1858
            }
        );
    }

    #[test]
    fn test_non_finite_value() {
        let output = ModelOutput {
            policy: vec![0.0; POLICY_SIZE],
            value: f32::INFINITY,
        };
        assert!(matches!(
            into_evaluation(output),
            Err(EvaluationError::NonFiniteValue(_))
        ));
    }
}
