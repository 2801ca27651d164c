//! Head-to-head matches between two oracles.
//!
//! Both sides search with the same budget and always play their most visited
//! move. The candidate has White in even-numbered games and Black in odd ones.

use anyhow::{Context, Result};
use lilichest_chess::{ChessPosition, Color};
use lilichest_core::Position;
use lilichest_mcts::{Oracle, SearchConfig, SearchEngine};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::driver::{search_event, GameRecord, GameResult};
use crate::events::{now_ms, EventLog, MatchEndEvent};

/// Match parameters.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    pub games: usize,
    pub search: SearchConfig,
    pub max_plies: usize,
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: 10,
            search: SearchConfig::for_evaluation(150),
            max_plies: 150,
            seed: 42,
        }
    }
}

/// Match score from the candidate's point of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub candidate_wins: usize,
    pub baseline_wins: usize,
    pub draws: usize,
}

impl MatchResult {
    pub fn games(&self) -> usize {
        self.candidate_wins + self.baseline_wins + self.draws
    }

    /// Points per game for the candidate: 1 per win, 0.5 per draw.
    pub fn score(&self) -> f64 {
        if self.games() == 0 {
            return 0.0;
        }
        (self.candidate_wins as f64 + 0.5 * self.draws as f64) / self.games() as f64
    }

    fn record(&mut self, result: GameResult, candidate_white: bool) {
        match (result, candidate_white) {
            (GameResult::Draw, _) => self.draws += 1,
            (GameResult::WhiteWin, true) | (GameResult::BlackWin, false) => {
                self.candidate_wins += 1
            }
            _ => self.baseline_wins += 1,
        }
    }

    fn end_event(&self) -> MatchEndEvent {
        MatchEndEvent {
            event: "match_end",
            ts_ms: now_ms(),
            games: self.games(),
            candidate_wins: self.candidate_wins,
            baseline_wins: self.baseline_wins,
            draws: self.draws,
            score: self.score(),
        }
    }
}

/// Play one game from the starting position, each side picking its most
/// visited move.
pub fn play_pairing<W, B>(
    white: &mut SearchEngine<ChessPosition, W, ChaCha8Rng>,
    black: &mut SearchEngine<ChessPosition, B, ChaCha8Rng>,
    max_plies: usize,
    game_id: usize,
    log: &mut EventLog,
) -> Result<GameRecord>
where
    W: Oracle<ChessPosition>,
    B: Oracle<ChessPosition>,
{
    let mut position = ChessPosition::starting();
    let mut moves = Vec::new();

    while !position.is_terminal() && moves.len() < max_plies {
        let result = match position.color_to_move() {
            Color::White => white.run(&position),
            Color::Black => black.run(&position),
        }
        .with_context(|| format!("Search failed at ply {} of game {}", moves.len(), game_id))?;

        let Some(mv) = result.best() else {
            break;
        };
        if log.is_enabled() {
            log.emit(&search_event(game_id, moves.len(), &position, mv, &result))?;
        }

        position = position.make_move(mv);
        moves.push(mv);
    }

    let record = GameRecord::finish(moves, position);
    log.emit(&record.end_event(game_id))?;
    Ok(record)
}

/// Play a match of `config.games` games with alternating colours.
pub fn play_match<B, C>(
    baseline: B,
    candidate: C,
    config: &MatchConfig,
    log: &mut EventLog,
) -> Result<MatchResult>
where
    B: Oracle<ChessPosition>,
    C: Oracle<ChessPosition>,
{
    let mut baseline = SearchEngine::new(
        config.search.clone(),
        baseline,
        ChaCha8Rng::seed_from_u64(config.seed),
    );
    let mut candidate = SearchEngine::new(
        config.search.clone(),
        candidate,
        ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1)),
    );

    let mut score = MatchResult::default();

    for game_id in 0..config.games {
        let candidate_white = game_id % 2 == 0;
        let record = if candidate_white {
            play_pairing(&mut candidate, &mut baseline, config.max_plies, game_id, log)?
        } else {
            play_pairing(&mut baseline, &mut candidate, config.max_plies, game_id, log)?
        };
        score.record(record.result, candidate_white);

        println!(
            "Game {}/{}: {} (candidate {}) in {} plies | candidate {} - {} baseline, {} draws",
            game_id + 1,
            config.games,
            record.result.as_str(),
            if candidate_white { "white" } else { "black" },
            record.plies(),
            score.candidate_wins,
            score.baseline_wins,
            score.draws
        );
    }

    log.emit(&score.end_event())?;
    log.flush()?;
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilichest_mcts::{RolloutOracle, UniformOracle};
    use std::fs;

    fn short_match(games: usize) -> MatchConfig {
        MatchConfig {
            games,
            search: SearchConfig::for_evaluation(8),
            max_plies: 6,
            seed: 11,
        }
    }

    #[test]
    fn test_score() {
        let result = MatchResult {
            candidate_wins: 3,
            baseline_wins: 1,
            draws: 2,
        };
        assert_eq!(result.games(), 6);
        assert!((result.score() - 4.0 / 6.0).abs() < 1e-9);
        assert_eq!(MatchResult::default().score(), 0.0);
    }

    #[test]
    fn test_record_alternates_colours() {
        let mut result = MatchResult::default();
        result.record(GameResult::WhiteWin, true);
        result.record(GameResult::WhiteWin, false);
        result.record(GameResult::BlackWin, false);
        result.record(GameResult::Draw, true);
        assert_eq!(
            result,
            MatchResult {
                candidate_wins: 2,
                baseline_wins: 1,
                draws: 1
            }
        );
    }

    #[test]
    fn test_short_match_is_drawn() {
        let rollout = RolloutOracle::new(ChaCha8Rng::seed_from_u64(2), 10);
        let result = play_match(UniformOracle, rollout, &short_match(2), &mut EventLog::disabled())
            .unwrap();
        assert_eq!(result.games(), 2);
        assert_eq!(result.draws, 2);
        assert!((result.score() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_pairing_is_greedy_and_deterministic() {
        let play = || {
            let mut white = SearchEngine::new(
                SearchConfig::for_evaluation(12),
                UniformOracle,
                ChaCha8Rng::seed_from_u64(0),
            );
            let mut black = SearchEngine::new(
                SearchConfig::for_evaluation(12),
                UniformOracle,
                ChaCha8Rng::seed_from_u64(0),
            );
            play_pairing(&mut white, &mut black, 6, 0, &mut EventLog::disabled())
                .unwrap()
                .moves
        };
        let moves = play();
        assert_eq!(moves.len(), 6);
        assert_eq!(moves, play());
    }

    #[test]
    fn test_match_logs_end_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.ndjson");
        let mut log = EventLog::open(&path).unwrap();

        play_match(UniformOracle, UniformOracle, &short_match(2), &mut log).unwrap();
        drop(log);

        let text = fs::read_to_string(&path).unwrap();
        let last: serde_json::Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
        assert_eq!(last["event"], "match_end");
        assert_eq!(last["games"], 2);
        assert_eq!(last["score"], 0.5);
    }
}
