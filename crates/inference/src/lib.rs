//! ONNX Runtime inference for chess search.
//!
//! This crate provides neural network inference using ONNX Runtime,
//! implementing the `Oracle` trait from `lilichest_mcts` for use in the search.

mod model;
mod oracle;

pub use model::{ModelOutput, OnnxModel};
pub use oracle::OnnxOracle;
