//! Command-line driver for the chess search.
//!
//! Runs a single search on a FEN, plays sequential self-play games, or
//! matches two models against each other. Without a model the random
//! rollout oracle stands in, so every command also runs self-contained.

mod arena;
mod driver;
mod events;

use anyhow::{Context, Result};
use arena::{play_match, MatchConfig};
use clap::{Parser, Subcommand};
use driver::{run_self_play, SelfPlayConfig};
use events::{EventLog, RunStartEvent};
use lilichest_chess::uci::to_uci;
use lilichest_chess::ChessPosition;
use lilichest_inference::OnnxOracle;
use lilichest_mcts::{Oracle, RolloutOracle, SearchConfig, SearchEngine};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Oracle-guided MCTS for chess.
#[derive(Parser)]
#[command(name = "lilichest")]
#[command(about = "Search chess positions, play self-play games and compare models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one position and print the visit distribution.
    Search {
        /// Position to search, as FEN.
        #[arg(long, default_value = lilichest_chess::STARTING_FEN)]
        fen: String,

        /// Number of simulations.
        #[arg(short, long, default_value = "400")]
        simulations: usize,

        /// Exploration constant of the PUCT formula.
        #[arg(long, default_value = "1.0")]
        cpuct: f32,

        /// ONNX policy/value model. Uses random rollouts if not given.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Maximum rollout depth (only used without --model).
        #[arg(long, default_value = "50")]
        rollout_depth: usize,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Play sequential self-play games.
    SelfPlay {
        /// Number of games to play.
        #[arg(short, long, default_value = "10")]
        games: usize,

        /// Number of simulations per move.
        #[arg(short, long, default_value = "150")]
        simulations: usize,

        /// Exploration constant of the PUCT formula.
        #[arg(long, default_value = "1.0")]
        cpuct: f32,

        /// Plies at the start of each game where moves are sampled.
        #[arg(long, default_value = "10")]
        sampling_plies: usize,

        /// Temperature for sampled moves (1.0 = proportional to visits).
        #[arg(short, long, default_value = "1.0")]
        temperature: f32,

        /// Games are stopped and scored as draws after this many plies.
        #[arg(long, default_value = "150")]
        max_plies: usize,

        /// Disable Dirichlet noise at the root.
        #[arg(long)]
        no_noise: bool,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// ONNX policy/value model. Uses random rollouts if not given.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Maximum rollout depth (only used without --model).
        #[arg(long, default_value = "50")]
        rollout_depth: usize,

        /// Append NDJSON events to this file.
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Match a candidate model against a baseline, alternating colours.
    Evaluate {
        /// Baseline ONNX model. Uses random rollouts if not given.
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Candidate ONNX model. Uses random rollouts if not given.
        #[arg(long)]
        candidate: Option<PathBuf>,

        /// Number of games to play.
        #[arg(short, long, default_value = "10")]
        games: usize,

        /// Number of simulations per move.
        #[arg(short, long, default_value = "150")]
        simulations: usize,

        /// Exploration constant of the PUCT formula.
        #[arg(long, default_value = "1.0")]
        cpuct: f32,

        /// Games are stopped and scored as draws after this many plies.
        #[arg(long, default_value = "150")]
        max_plies: usize,

        /// Maximum rollout depth (only used without a model).
        #[arg(long, default_value = "50")]
        rollout_depth: usize,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Append NDJSON events to this file.
        #[arg(long)]
        events: Option<PathBuf>,
    },
}

/// Load the ONNX oracle at `model`, or fall back to random rollouts.
fn load_oracle(
    model: Option<&Path>,
    rollout_depth: usize,
    seed: u64,
) -> Result<Box<dyn Oracle<ChessPosition>>> {
    match model {
        Some(path) => {
            println!("Loading model from {:?}", path);
            let oracle = OnnxOracle::new(path)
                .with_context(|| format!("Failed to load model from {:?}", path))?;
            Ok(Box::new(oracle))
        }
        None => Ok(Box::new(RolloutOracle::new(
            ChaCha8Rng::seed_from_u64(seed),
            rollout_depth,
        ))),
    }
}

fn open_log(path: Option<&Path>) -> Result<EventLog> {
    match path {
        Some(path) => {
            println!("Event log: {:?}", path);
            EventLog::open(path)
        }
        None => Ok(EventLog::disabled()),
    }
}

fn describe(model: Option<&Path>) -> String {
    model.map_or_else(|| "rollout".to_string(), |p| p.display().to_string())
}

fn cmd_search(
    fen: &str,
    simulations: usize,
    cpuct: f32,
    model: Option<&Path>,
    rollout_depth: usize,
    seed: u64,
) -> Result<()> {
    let position = ChessPosition::from_fen(fen)?;
    let oracle = load_oracle(model, rollout_depth, seed.wrapping_add(1))?;
    let config = SearchConfig {
        exploration_constant: cpuct,
        ..SearchConfig::for_evaluation(simulations)
    };
    let mut engine = SearchEngine::new(config, oracle, ChaCha8Rng::seed_from_u64(seed));

    println!("Position: {}", position.fen());
    println!(
        "Searching with {} simulations (cpuct {}, {})",
        simulations,
        cpuct,
        describe(model)
    );

    let start = Instant::now();
    let result = engine.run(&position)?;
    let elapsed = start.elapsed();

    if result.is_empty() {
        match position.termination() {
            Some(reason) => println!("No moves: game is over ({:?})", reason),
            None => println!("No moves: nothing was searched"),
        }
        return Ok(());
    }

    println!(
        "\nRoot value: {:+.3} | tree size: {} | failed evaluations: {} | {:.2}s",
        result.root_value,
        result.tree_size,
        result.failed_evaluations,
        elapsed.as_secs_f64()
    );
    println!("{:>4}  {:<6} {:>8} {:>7}", "#", "move", "fraction", "visits");
    for (rank, &(mv, fraction)) in result.distribution.iter().enumerate() {
        let visits = result
            .visit_counts
            .iter()
            .find(|(m, _)| *m == mv)
            .map_or(0, |&(_, n)| n);
        println!(
            "{:>4}  {:<6} {:>8.4} {:>7}",
            rank + 1,
            to_uci(mv),
            fraction,
            visits
        );
    }

    Ok(())
}

fn cmd_self_play(
    config: SelfPlayConfig,
    simulations: usize,
    cpuct: f32,
    no_noise: bool,
    model: Option<&Path>,
    rollout_depth: usize,
    events: Option<&Path>,
) -> Result<()> {
    let mut search = SearchConfig::for_self_play(simulations);
    search.exploration_constant = cpuct;
    if no_noise {
        search.root_noise = None;
    }

    let oracle = load_oracle(model, rollout_depth, config.seed.wrapping_add(1))?;
    let mut log = open_log(events)?;
    log.emit(&RunStartEvent::new(
        "self-play",
        config.seed,
        config.games,
        model.map(|p| p.display().to_string()),
        search.clone(),
    ))?;

    println!(
        "Playing {} games with {} simulations/move ({})",
        config.games,
        simulations,
        describe(model)
    );
    println!("Seed: {}", config.seed);

    let start = Instant::now();
    let mut engine = SearchEngine::new(search, oracle, ChaCha8Rng::seed_from_u64(config.seed));
    let tally = run_self_play(&mut engine, &config, &mut log)?;

    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!("Games played: {}", tally.games());
    println!(
        "Outcomes: White wins: {}, Black wins: {}, Draws: {}",
        tally.white_wins, tally.black_wins, tally.draws
    );

    Ok(())
}

fn cmd_evaluate(
    baseline: Option<&Path>,
    candidate: Option<&Path>,
    config: MatchConfig,
    rollout_depth: usize,
    events: Option<&Path>,
) -> Result<()> {
    let baseline_oracle = load_oracle(baseline, rollout_depth, config.seed.wrapping_add(2))?;
    let candidate_oracle = load_oracle(candidate, rollout_depth, config.seed.wrapping_add(3))?;

    let mut log = open_log(events)?;
    log.emit(&RunStartEvent::new(
        "evaluate",
        config.seed,
        config.games,
        candidate.map(|p| p.display().to_string()),
        config.search.clone(),
    ))?;

    println!(
        "\nPlaying {} games: candidate ({}) vs baseline ({}), {} simulations/move",
        config.games,
        describe(candidate),
        describe(baseline),
        config.search.num_simulations
    );
    println!("================================================");

    let result = play_match(baseline_oracle, candidate_oracle, &config, &mut log)?;

    let pct = |n: usize| n as f64 / result.games().max(1) as f64 * 100.0;
    println!("\n================================================");
    println!("FINAL RESULTS");
    println!("================================================");
    println!("Candidate wins: {} ({:.1}%)", result.candidate_wins, pct(result.candidate_wins));
    println!("Baseline wins:  {} ({:.1}%)", result.baseline_wins, pct(result.baseline_wins));
    println!("Draws:          {} ({:.1}%)", result.draws, pct(result.draws));
    println!("------------------------------------------------");
    println!("Candidate score: {:.3}", result.score());

    if result.candidate_wins > result.baseline_wins {
        println!("\nThe candidate is stronger.");
    } else {
        println!("\nThe candidate is not stronger.");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            fen,
            simulations,
            cpuct,
            model,
            rollout_depth,
            seed,
        } => cmd_search(&fen, simulations, cpuct, model.as_deref(), rollout_depth, seed),

        Commands::SelfPlay {
            games,
            simulations,
            cpuct,
            sampling_plies,
            temperature,
            max_plies,
            no_noise,
            seed,
            model,
            rollout_depth,
            events,
        } => cmd_self_play(
            SelfPlayConfig {
                games,
                sampling_plies,
                temperature,
                max_plies,
                seed,
            },
            simulations,
            cpuct,
            no_noise,
            model.as_deref(),
            rollout_depth,
            events.as_deref(),
        ),

        Commands::Evaluate {
            baseline,
            candidate,
            games,
            simulations,
            cpuct,
            max_plies,
            rollout_depth,
            seed,
            events,
        } => cmd_evaluate(
            baseline.as_deref(),
            candidate.as_deref(),
            MatchConfig {
                games,
                search: SearchConfig {
                    exploration_constant: cpuct,
                    ..SearchConfig::for_evaluation(simulations)
                },
                max_plies,
                seed,
            },
            rollout_depth,
            events.as_deref(),
        ),
    }
}
