//! Search configuration parameters.
//!
//! The simulation count is the only budget a search has; everything else
//! shapes how the budget is spent.

use serde::{Deserialize, Serialize};

/// Dirichlet noise mixed into the root priors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootNoise {
    /// Dirichlet concentration.
    /// Higher values = more uniform noise, lower = more concentrated.
    pub alpha: f32,

    /// Fraction of each root prior replaced with noise.
    pub fraction: f32,
}

/// Search configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of simulations per search.
    pub num_simulations: usize,

    /// Exploration constant `c` of the PUCT formula.
    pub exploration_constant: f32,

    /// Added to the visit count when averaging a child's value.
    pub value_epsilon: f32,

    /// Raw prior given to a legal move whose index has no slot in the
    /// oracle's vector.
    pub unknown_prior: f32,

    /// Prior multiplier for a child whose position already occurred twice
    /// or more on the path from the root.
    pub strong_repetition_damping: f32,

    /// Prior multiplier for a child whose position occurred once on the path.
    pub mild_repetition_damping: f32,

    /// Consecutive oracle failures tolerated before the search gives up.
    pub max_evaluation_retries: u32,

    /// Exploration noise at the root. Off unless generating training games.
    pub root_noise: Option<RootNoise>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_simulations: 400,
            exploration_constant: 1.0,
            value_epsilon: 1e-8,
            unknown_prior: 1e-10,
            strong_repetition_damping: 0.1,
            mild_repetition_damping: 0.5,
            max_evaluation_retries: 3,
            root_noise: None,
        }
    }
}

impl SearchConfig {
    /// Create a new config with the specified number of simulations.
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    /// Config for head-to-head evaluation: no exploration noise.
    pub fn for_evaluation(num_simulations: usize) -> Self {
        Self::with_simulations(num_simulations)
    }

    /// Config for self-play: Dirichlet noise at the root.
    pub fn for_self_play(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            root_noise: Some(RootNoise {
                alpha: 0.3,
                fraction: 0.25,
            }),
            ..Default::default()
        }
    }

    /// Prior multiplier for a child seen `occurrences` times on the path.
    pub fn repetition_damping(&self, occurrences: usize) -> f32 {
        match occurrences {
            0 => 1.0,
            1 => self.mild_repetition_damping,
            _ => self.strong_repetition_damping,
        }
    }
}
