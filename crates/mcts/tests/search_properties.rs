//! Property-based tests for the search on real chess positions.
//!
//! These check the guarantees callers rely on:
//! - The distribution sums to 1 and covers each legal move exactly once
//! - Every reported move is legal in the root position
//! - Degenerate inputs (no budget, finished games) give empty results
//! - Same seed, same answer

use std::collections::HashSet;

use lilichest_chess::{ChessMove, ChessPosition};
use lilichest_core::Position;
use lilichest_mcts::{RolloutOracle, SearchConfig, SearchEngine, UniformOracle};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Tolerance for distribution sum validation
const SUM_TOLERANCE: f32 = 1e-4;

// =============================================================================
// Strategies for generating test inputs
// =============================================================================

/// Generate a random seed for the search
fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Generate a random number of simulations (1-60 for fast tests)
fn arb_simulations() -> impl Strategy<Value = usize> {
    1usize..60
}

/// Generate a non-terminal position by making random moves from the start.
fn arb_position() -> impl Strategy<Value = ChessPosition> {
    proptest::collection::vec(0usize..256, 0..30).prop_map(|choices| {
        let mut pos = ChessPosition::starting();
        for idx in choices {
            let moves = pos.legal_moves();
            let next = pos.apply_move(moves[idx % moves.len()]);
            if next.is_terminal() {
                break;
            }
            pos = next;
        }
        pos
    })
}

fn rollout_engine(
    seed: u64,
    config: SearchConfig,
) -> SearchEngine<ChessPosition, RolloutOracle<ChaCha8Rng>, ChaCha8Rng> {
    let rng = ChaCha8Rng::seed_from_u64(seed);
    SearchEngine::new(config, RolloutOracle::new(rng.clone(), 16), rng)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The distribution sums to 1 over exactly the legal moves
    #[test]
    fn prop_distribution_covers_legal_moves(
        seed in arb_seed(),
        simulations in arb_simulations(),
        pos in arb_position()
    ) {
        let mut engine = rollout_engine(seed, SearchConfig::default());
        let result = engine.search(&pos, simulations, 1.0).unwrap();

        let sum: f32 = result.distribution.iter().map(|&(_, f)| f).sum();
        prop_assert!((sum - 1.0).abs() < SUM_TOLERANCE, "sum = {}", sum);

        let legal: HashSet<ChessMove> = pos.legal_moves().into_iter().collect();
        let reported: HashSet<ChessMove> = result.distribution.iter().map(|&(mv, _)| mv).collect();
        prop_assert_eq!(reported.len(), result.distribution.len(), "duplicate moves");
        prop_assert_eq!(reported, legal);

        for &(_, fraction) in &result.distribution {
            prop_assert!((0.0..=1.0).contains(&fraction));
        }
    }

    /// Every simulation adds exactly one visit below the root
    #[test]
    fn prop_visits_match_simulations(
        seed in arb_seed(),
        simulations in arb_simulations(),
        pos in arb_position()
    ) {
        let mut engine = rollout_engine(seed, SearchConfig::default());
        let result = engine.search(&pos, simulations, 1.0).unwrap();

        let total: u32 = result.visit_counts.iter().map(|&(_, n)| n).sum();
        prop_assert_eq!(total as usize, simulations);
    }

    /// The distribution is sorted and its head is the reported best move
    #[test]
    fn prop_distribution_sorted(
        seed in arb_seed(),
        pos in arb_position()
    ) {
        let mut engine = rollout_engine(seed, SearchConfig::for_self_play(40));
        let result = engine.run(&pos).unwrap();

        for pair in result.distribution.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
        prop_assert_eq!(result.best(), result.distribution.first().map(|&(mv, _)| mv));
    }

    /// Root value stays in [-1, 1]
    #[test]
    fn prop_root_value_in_range(
        seed in arb_seed(),
        simulations in arb_simulations(),
        pos in arb_position()
    ) {
        let mut engine = rollout_engine(seed, SearchConfig::default());
        let result = engine.search(&pos, simulations, 2.0).unwrap();
        prop_assert!(result.root_value >= -1.0 - 1e-5 && result.root_value <= 1.0 + 1e-5);
    }

    /// Same seed should produce identical results
    #[test]
    fn prop_deterministic(
        seed in arb_seed(),
        pos in arb_position()
    ) {
        let first = rollout_engine(seed, SearchConfig::for_self_play(30)).run(&pos).unwrap();
        let second = rollout_engine(seed, SearchConfig::for_self_play(30)).run(&pos).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Zero simulations never touches the oracle and returns nothing
    #[test]
    fn prop_zero_simulations_is_empty(pos in arb_position()) {
        let mut engine = rollout_engine(0, SearchConfig::default());
        let result = engine.search(&pos, 0, 1.0).unwrap();
        prop_assert!(result.is_empty());
    }
}

#[test]
fn single_legal_move_gets_everything() {
    // White king on a1 must take the queen on b2
    let pos = ChessPosition::from_fen("k7/8/8/8/8/8/1q6/K7 w - - 0 1").unwrap();
    assert_eq!(pos.legal_moves().len(), 1);

    let mut engine = rollout_engine(1, SearchConfig::default());
    let result = engine.search(&pos, 25, 1.0).unwrap();

    assert_eq!(result.distribution.len(), 1);
    assert_eq!(result.distribution[0].0, pos.legal_moves()[0]);
    assert!((result.distribution[0].1 - 1.0).abs() < 1e-6);
}

#[test]
fn checkmated_root_is_empty() {
    // Fool's mate
    let pos = ChessPosition::from_fen(
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
    )
    .unwrap();
    assert!(pos.is_terminal());

    let mut engine = rollout_engine(1, SearchConfig::default());
    let result = engine.search(&pos, 50, 1.0).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.root_value, -1.0);
}

#[test]
fn stalemated_root_is_empty() {
    let pos = ChessPosition::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let mut engine = rollout_engine(1, SearchConfig::default());
    let result = engine.search(&pos, 50, 1.0).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.root_value, 0.0);
}

#[test]
fn finds_mate_in_one() {
    // Back-rank mate: Ra8#
    let pos = ChessPosition::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let mate = pos.play_uci("a1a8").unwrap();
    assert!(mate.is_terminal());

    let config = SearchConfig::with_simulations(800);
    let mut engine = SearchEngine::new(config, UniformOracle, ChaCha8Rng::seed_from_u64(5));
    let result = engine.run(&pos).unwrap();

    assert_eq!(result.best(), mate.last_moves().last().copied());
}
