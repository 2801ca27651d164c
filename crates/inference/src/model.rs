//! ONNX Runtime session management.

use anyhow::{ensure, Context, Result};
use lilichest_chess::features::{FEATURE_SIZE, NUM_FEATURE_PLANES};
use ort::{session::Session, value::Value};
use std::cell::RefCell;
use std::path::Path;

/// Raw network output for one position.
#[derive(Clone, Debug)]
pub struct ModelOutput {
    /// Dense policy over the move index space.
    pub policy: Vec<f32>,

    /// Value head output from the side to move.
    pub value: f32,
}

/// ONNX policy/value network.
///
/// Input: one `[1, 22, 8, 8]` feature tensor.
/// Outputs, in order: policy `[1, 4672]` and value `[1, 1]`.
pub struct OnnxModel {
    session: RefCell<Session>,
}

impl OnnxModel {
    /// Load a model from an `.onnx` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let session = Session::builder()?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load policy/value model from {:?}", path))?;

        Ok(Self {
            session: RefCell::new(session),
        })
    }

    /// Run the network on a flattened feature tensor (22 * 64 floats).
    pub fn infer(&self, features: &[f32]) -> Result<ModelOutput> {
        ensure!(
            features.len() == FEATURE_SIZE,
            "feature tensor has {} elements, expected {}",
            features.len(),
            FEATURE_SIZE
        );

        // Create input as (shape, Vec<T>) tuple
        let shape: Vec<i64> = vec![1, NUM_FEATURE_PLANES as i64, 8, 8];
        let input = Value::from_array((shape, features.to_vec()))?;

        let mut session = self.session.borrow_mut();
        let outputs = session.run(ort::inputs![input])?;

        let names: Vec<_> = outputs.keys().collect();
        ensure!(
            names.len() >= 2,
            "model has {} outputs, expected policy and value",
            names.len()
        );

        let (_, policy) = outputs
            .get(names[0])
            .context("Failed to get policy tensor")?
            .try_extract_tensor::<f32>()?;
        let (_, value) = outputs
            .get(names[1])
            .context("Failed to get value tensor")?
            .try_extract_tensor::<f32>()?;

        Ok(ModelOutput {
            policy: policy.to_vec(),
            value: value.first().copied().context("Empty value output")?,
        })
    }
}
