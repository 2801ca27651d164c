//! Append-only NDJSON event log for run post-mortems.
//!
//! Each event is one JSON object on its own line with an `event` tag and a
//! millisecond timestamp. A crashed run leaves at worst one partial trailing
//! line behind.

use anyhow::{Context, Result};
use lilichest_mcts::SearchConfig;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    ///
    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(path: impl AsRef<Path>, flush_every_lines: u64) -> Result<Self> {
        let path = path.as_ref();
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log {:?}", path))?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<()> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

/// Optional event sink: a no-op unless a log file was requested.
#[derive(Default)]
pub struct EventLog {
    writer: Option<NdjsonWriter>,
}

impl EventLog {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Log to `path`, flushing after every event.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: Some(NdjsonWriter::open_append_with_flush(path, 1)?),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn emit<T: Serialize>(&mut self, event: &T) -> Result<()> {
        match &mut self.writer {
            Some(w) => w.write_event(event),
            None => Ok(()),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match &mut self.writer {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStartEvent {
    pub event: &'static str,
    pub ts_ms: u64,
    pub command: &'static str,
    pub seed: u64,
    pub games: usize,
    pub model: Option<String>,
    pub search: SearchConfig,
}

impl RunStartEvent {
    pub fn new(
        command: &'static str,
        seed: u64,
        games: usize,
        model: Option<String>,
        search: SearchConfig,
    ) -> Self {
        Self {
            event: "run_start",
            ts_ms: now_ms(),
            command,
            seed,
            games,
            model,
            search,
        }
    }
}

/// One entry of the reported root distribution.
#[derive(Debug, Clone, Serialize)]
pub struct MoveShare {
    pub uci: String,
    pub fraction: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchEvent {
    pub event: &'static str,
    pub ts_ms: u64,
    pub game_id: usize,
    pub ply: usize,
    pub fen: String,
    pub chosen: String,
    pub root_value: f32,
    pub tree_size: usize,
    pub failed_evaluations: u32,
    /// Most visited moves, best first.
    pub top: Vec<MoveShare>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameEndEvent {
    pub event: &'static str,
    pub ts_ms: u64,
    pub game_id: usize,
    pub plies: usize,
    /// "1-0", "0-1" or "1/2-1/2".
    pub result: &'static str,
    /// Why the game ended; `None` when stopped at the ply limit.
    pub termination: Option<String>,
    pub final_fen: String,
    pub moves: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchEndEvent {
    pub event: &'static str,
    pub ts_ms: u64,
    pub games: usize,
    pub candidate_wins: usize,
    pub baseline_wins: usize,
    pub draws: usize,
    pub score: f64,
}
