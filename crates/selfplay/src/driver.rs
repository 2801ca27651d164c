//! Sequential self-play games.
//!
//! A game samples moves in proportion to the search's visit fractions for the
//! first few plies, then always plays the most visited move. Games stop at
//! a terminal position or at the ply limit, whichever comes first.

use anyhow::{Context, Result};
use lilichest_chess::uci::to_uci;
use lilichest_chess::{ChessMove, ChessPosition, Color, Termination};
use lilichest_core::Position;
use lilichest_mcts::{Oracle, SearchEngine, SearchResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::events::{now_ms, EventLog, GameEndEvent, MoveShare, SearchEvent};

/// Number of root moves reported in each search event.
const TOP_MOVES_LOGGED: usize = 5;

/// Final result of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
}

impl GameResult {
    /// Result of a game that stopped at `position`. Games cut off at the ply
    /// limit count as draws.
    pub fn of(position: &ChessPosition) -> Self {
        match position.termination() {
            Some(Termination::Checkmate) => match position.color_to_move() {
                Color::White => GameResult::BlackWin,
                Color::Black => GameResult::WhiteWin,
            },
            _ => GameResult::Draw,
        }
    }

    /// PGN result token.
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }
}

/// A finished game.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub moves: Vec<ChessMove>,
    pub result: GameResult,
    /// `None` if the game hit the ply limit.
    pub termination: Option<Termination>,
    pub final_position: ChessPosition,
}

impl GameRecord {
    pub(crate) fn finish(moves: Vec<ChessMove>, final_position: ChessPosition) -> Self {
        Self {
            result: GameResult::of(&final_position),
            termination: final_position.termination(),
            moves,
            final_position,
        }
    }

    pub fn plies(&self) -> usize {
        self.moves.len()
    }

    pub(crate) fn end_event(&self, game_id: usize) -> GameEndEvent {
        GameEndEvent {
            event: "game_end",
            ts_ms: now_ms(),
            game_id,
            plies: self.plies(),
            result: self.result.as_str(),
            termination: self.termination.map(|t| format!("{:?}", t)),
            final_fen: self.final_position.fen(),
            moves: self.moves.iter().map(|&mv| to_uci(mv)).collect(),
        }
    }
}

/// White/black/draw counts over a series of games.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
}

impl Tally {
    pub fn record(&mut self, result: GameResult) {
        match result {
            GameResult::WhiteWin => self.white_wins += 1,
            GameResult::BlackWin => self.black_wins += 1,
            GameResult::Draw => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.white_wins + self.black_wins + self.draws
    }
}

/// Self-play parameters outside the search itself.
#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub games: usize,

    /// Plies at the start of a game where moves are sampled.
    pub sampling_plies: usize,

    /// Sampling temperature for those plies.
    pub temperature: f32,

    /// Games are cut off after this many plies.
    pub max_plies: usize,

    /// Base seed; game `i` samples with `seed + i * 1000`.
    pub seed: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            games: 10,
            sampling_plies: 10,
            temperature: 1.0,
            max_plies: 150,
            seed: 42,
        }
    }
}

impl SelfPlayConfig {
    /// Get the effective temperature for a given ply.
    ///
    /// Returns `temperature` during the sampling plies, then 0 (greedy).
    pub fn effective_temperature(&self, ply: usize) -> f32 {
        if ply < self.sampling_plies {
            self.temperature
        } else {
            0.0
        }
    }

    pub fn game_seed(&self, game_id: usize) -> u64 {
        self.seed.wrapping_add(game_id as u64 * 1000)
    }
}

/// Play one self-play game from the starting position.
pub fn play_game<O, R, S>(
    engine: &mut SearchEngine<ChessPosition, O, R>,
    config: &SelfPlayConfig,
    game_id: usize,
    rng: &mut S,
    log: &mut EventLog,
) -> Result<GameRecord>
where
    O: Oracle<ChessPosition>,
    R: Rng,
    S: Rng,
{
    let mut position = ChessPosition::starting();
    let mut moves = Vec::new();

    while !position.is_terminal() && moves.len() < config.max_plies {
        let ply = moves.len();
        let result = engine
            .run(&position)
            .with_context(|| format!("Search failed at ply {} of game {}", ply, game_id))?;

        let Some(mv) = result.select_move(config.effective_temperature(ply), rng) else {
            break;
        };

        if log.is_enabled() {
            log.emit(&search_event(game_id, ply, &position, mv, &result))?;
        }

        position = position.make_move(mv);
        moves.push(mv);
    }

    let record = GameRecord::finish(moves, position);
    log.emit(&record.end_event(game_id))?;
    Ok(record)
}

/// Play `config.games` games one after another, printing progress.
pub fn run_self_play<O, R>(
    engine: &mut SearchEngine<ChessPosition, O, R>,
    config: &SelfPlayConfig,
    log: &mut EventLog,
) -> Result<Tally>
where
    O: Oracle<ChessPosition>,
    R: Rng,
{
    let mut tally = Tally::default();

    for game_id in 0..config.games {
        let mut rng = ChaCha8Rng::seed_from_u64(config.game_seed(game_id));
        let record = play_game(engine, config, game_id, &mut rng, log)?;
        tally.record(record.result);

        let reason = record
            .termination
            .map_or_else(|| "ply limit".to_string(), |t| format!("{:?}", t));
        println!(
            "Game {}/{}: {} in {} plies ({})",
            game_id + 1,
            config.games,
            record.result.as_str(),
            record.plies(),
            reason
        );
    }

    log.flush()?;
    Ok(tally)
}

pub(crate) fn search_event(
    game_id: usize,
    ply: usize,
    position: &ChessPosition,
    chosen: ChessMove,
    result: &SearchResult<ChessMove>,
) -> SearchEvent {
    SearchEvent {
        event: "search",
        ts_ms: now_ms(),
        game_id,
        ply,
        fen: position.fen(),
        chosen: to_uci(chosen),
        root_value: result.root_value,
        tree_size: result.tree_size,
        failed_evaluations: result.failed_evaluations,
        top: result
            .distribution
            .iter()
            .take(TOP_MOVES_LOGGED)
            .map(|&(mv, fraction)| MoveShare {
                uci: to_uci(mv),
                fraction,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilichest_mcts::{RolloutOracle, SearchConfig, UniformOracle};
    use std::fs;

    fn quick_config(max_plies: usize) -> SelfPlayConfig {
        SelfPlayConfig {
            games: 2,
            max_plies,
            ..Default::default()
        }
    }

    fn uniform_engine() -> SearchEngine<ChessPosition, UniformOracle, ChaCha8Rng> {
        SearchEngine::new(
            SearchConfig::for_self_play(8),
            UniformOracle,
            ChaCha8Rng::seed_from_u64(1),
        )
    }

    #[test]
    fn test_effective_temperature() {
        let config = SelfPlayConfig::default();
        assert_eq!(config.effective_temperature(0), 1.0);
        assert_eq!(config.effective_temperature(9), 1.0);
        assert_eq!(config.effective_temperature(10), 0.0);
        assert_eq!(config.effective_temperature(100), 0.0);
    }

    #[test]
    fn test_game_result_of_checkmate() {
        // Fool's mate, white to move and mated
        let mated = ChessPosition::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(GameResult::of(&mated), GameResult::BlackWin);
        assert_eq!(GameResult::of(&ChessPosition::starting()), GameResult::Draw);
    }

    #[test]
    fn test_play_game_respects_ply_limit() {
        let mut engine = uniform_engine();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let record = play_game(
            &mut engine,
            &quick_config(6),
            0,
            &mut rng,
            &mut EventLog::disabled(),
        )
        .unwrap();

        assert_eq!(record.plies(), 6);
        assert_eq!(record.result, GameResult::Draw);
        assert_eq!(record.termination, None);
        assert_eq!(record.final_position.fullmove_number(), 4);
    }

    #[test]
    fn test_play_game_deterministic() {
        let play = || {
            let mut engine = SearchEngine::new(
                SearchConfig::for_self_play(10),
                RolloutOracle::new(ChaCha8Rng::seed_from_u64(9), 10),
                ChaCha8Rng::seed_from_u64(9),
            );
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            play_game(
                &mut engine,
                &quick_config(12),
                0,
                &mut rng,
                &mut EventLog::disabled(),
            )
            .unwrap()
            .moves
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_run_self_play_logs_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selfplay.ndjson");
        let mut log = EventLog::open(&path).unwrap();

        let tally = run_self_play(&mut uniform_engine(), &quick_config(4), &mut log).unwrap();
        assert_eq!(tally.games(), 2);
        assert_eq!(tally.draws, 2);
        drop(log);

        let lines: Vec<serde_json::Value> = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        let searches = lines.iter().filter(|v| v["event"] == "search").count();
        let ends: Vec<_> = lines.iter().filter(|v| v["event"] == "game_end").collect();
        assert_eq!(searches, 8);
        assert_eq!(ends.len(), 2);
        assert_eq!(ends[0]["plies"], 4);
        assert_eq!(ends[0]["result"], "1/2-1/2");
        assert!(ends[0]["termination"].is_null());

        let first = &lines[0];
        assert_eq!(first["ply"], 0);
        assert_eq!(
            first["fen"],
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert!(first["top"].as_array().unwrap().len() <= TOP_MOVES_LOGGED);
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        tally.record(GameResult::WhiteWin);
        tally.record(GameResult::Draw);
        tally.record(GameResult::Draw);
        assert_eq!(
            tally,
            Tally {
                white_wins: 1,
                black_wins: 0,
                draws: 2
            }
        );
        assert_eq!(tally.games(), 3);
    }
}
