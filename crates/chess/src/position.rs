//! Chess positions backed by the `chess` rules crate.
//!
//! `chess::Board` knows piece placement, castling and en passant but has no
//! move clocks or game history. [`ChessPosition`] adds the halfmove clock,
//! the fullmove number, a repetition history and the last moves played, which
//! is everything the search and the feature planes need.

use std::fmt;
use std::str::FromStr;

use chess::{BitBoard, Board, BoardStatus, ChessMove, Color, MoveGen, Piece, EMPTY};
use lilichest_core::{Error, Outcome, Player, Result};

use crate::move_index::{MoveIndex, POLICY_SIZE};
use crate::uci;

/// Number of previous moves remembered for the oracle.
pub const HISTORY_LEN: usize = 2;

/// Standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Why a game ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Termination {
    Checkmate,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl Termination {
    /// Outcome for the side to move in the terminal position.
    pub fn outcome(self) -> Outcome {
        match self {
            Termination::Checkmate => Outcome::Loss,
            _ => Outcome::Draw,
        }
    }
}

/// A complete chess position.
#[derive(Clone)]
pub struct ChessPosition {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Hashes of earlier positions since the last capture or pawn move.
    history: Vec<u64>,
    /// Up to `HISTORY_LEN` moves that led here, oldest first.
    recent: Vec<ChessMove>,
}

impl ChessPosition {
    /// The standard starting position.
    pub fn starting() -> Self {
        Self::from_board(Board::default())
    }

    /// Wrap a board with fresh clocks and no history.
    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
            recent: Vec::new(),
        }
    }

    /// Parse a FEN string. The clock fields are optional.
    ///
    /// # Errors
    /// Returns `Error::InvalidFen` if the rules crate rejects the placement
    /// or the clocks are not numbers.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let board = Board::from_str(fen)
            .map_err(|e| Error::InvalidFen(format!("{}: {}", fen, e)))?;

        let fields: Vec<&str> = fen.split_whitespace().collect();
        let parse_clock = |index: usize, default: u32| -> Result<u32> {
            match fields.get(index) {
                Some(field) => field
                    .parse()
                    .map_err(|_| Error::InvalidFen(format!("{}: bad clock '{}'", fen, field))),
                None => Ok(default),
            }
        };

        let mut position = Self::from_board(board);
        position.halfmove_clock = parse_clock(4, 0)?;
        position.fullmove_number = parse_clock(5, 1)?.max(1);
        Ok(position)
    }

    /// FEN of this position, including the clocks.
    pub fn fen(&self) -> String {
        // The rules crate prints its own placeholder clocks; keep the first
        // four fields and append ours.
        let board_fen = self.board.to_string();
        let head: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            head.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The underlying rules-crate board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Colour to move.
    pub fn color_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Moves that led here, oldest first (at most `HISTORY_LEN`).
    pub fn last_moves(&self) -> &[ChessMove] {
        &self.recent
    }

    /// True if the side to move is in check.
    pub fn is_check(&self) -> bool {
        *self.board.checkers() != EMPTY
    }

    /// All legal moves.
    pub fn legal(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    /// True if `mv` is legal here.
    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board.legal(mv)
    }

    /// Apply a move, returning the new position.
    ///
    /// The move must be legal; use [`ChessPosition::play_uci`] for untrusted
    /// input.
    pub fn make_move(&self, mv: ChessMove) -> Self {
        let irreversible = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();

        let mut history = if irreversible {
            Vec::new()
        } else {
            self.history.clone()
        };
        history.push(self.board.get_hash());

        let mut recent = self.recent.clone();
        recent.push(mv);
        if recent.len() > HISTORY_LEN {
            recent.remove(0);
        }

        Self {
            board: self.board.make_move_new(mv),
            halfmove_clock: if irreversible {
                0
            } else {
                self.halfmove_clock + 1
            },
            fullmove_number: match self.board.side_to_move() {
                Color::White => self.fullmove_number,
                Color::Black => self.fullmove_number + 1,
            },
            history,
            recent,
        }
    }

    /// Parse a UCI move and apply it if legal.
    ///
    /// # Errors
    /// Returns `Error::InvalidMove` if the text is malformed or the move is
    /// illegal in this position.
    pub fn play_uci(&self, text: &str) -> Result<Self> {
        let mv = uci::parse_uci(text)?;
        if !self.is_legal(mv) {
            return Err(Error::InvalidMove(format!(
                "{} is illegal in {}",
                text,
                self.fen()
            )));
        }
        Ok(self.make_move(mv))
    }

    /// How many times the current placement occurred earlier in the game.
    pub fn repetitions(&self) -> usize {
        let hash = self.board.get_hash();
        self.history.iter().filter(|&&h| h == hash).count()
    }

    /// Why the game is over, if it is.
    pub fn termination(&self) -> Option<Termination> {
        match self.board.status() {
            BoardStatus::Checkmate => return Some(Termination::Checkmate),
            BoardStatus::Stalemate => return Some(Termination::Stalemate),
            BoardStatus::Ongoing => {}
        }

        if self.halfmove_clock >= 100 {
            return Some(Termination::FiftyMoveRule);
        }
        if self.repetitions() >= 2 {
            return Some(Termination::ThreefoldRepetition);
        }
        if self.is_insufficient_material() {
            return Some(Termination::InsufficientMaterial);
        }
        None
    }

    /// Check for insufficient material to checkmate
    fn is_insufficient_material(&self) -> bool {
        let board = &self.board;
        let heavy =
            board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let count = |piece: Piece, color: Color| -> u32 {
            (board.pieces(piece) & board.color_combined(color)).popcnt()
        };
        let white_minors = count(Piece::Knight, Color::White) + count(Piece::Bishop, Color::White);
        let black_minors = count(Piece::Knight, Color::Black) + count(Piece::Bishop, Color::Black);

        // K vs K, K+N vs K, K+B vs K
        if white_minors + black_minors <= 1 {
            return true;
        }

        // K+B vs K+B with both bishops on the same square colour
        let bishops = *board.pieces(Piece::Bishop);
        if white_minors == 1 && black_minors == 1 && bishops.popcnt() == 2 {
            let shades: Vec<usize> = square_shades(bishops).collect();
            return shades[0] == shades[1];
        }

        false
    }
}

fn square_shades(bitboard: BitBoard) -> impl Iterator<Item = usize> {
    bitboard.map(|sq| (sq.get_rank().to_index() + sq.get_file().to_index()) % 2)
}

/// Maps a chess colour onto the engine's player.
pub fn player_of(color: Color) -> Player {
    match color {
        Color::White => Player::First,
        Color::Black => Player::Second,
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::starting()
    }
}

impl PartialEq for ChessPosition {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
    }
}

impl fmt::Debug for ChessPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChessPosition")
            .field("fen", &self.fen())
            .field("repetitions", &self.repetitions())
            .finish()
    }
}

impl fmt::Display for ChessPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen())
    }
}

impl lilichest_core::Position for ChessPosition {
    type Move = ChessMove;

    const NUM_ACTIONS: usize = POLICY_SIZE;

    fn legal_moves(&self) -> Vec<ChessMove> {
        self.legal()
    }

    fn apply_move(&self, mv: ChessMove) -> Self {
        self.make_move(mv)
    }

    fn side_to_move(&self) -> Player {
        player_of(self.board.side_to_move())
    }

    fn outcome(&self) -> Option<Outcome> {
        self.termination().map(Termination::outcome)
    }

    fn structural_hash(&self) -> u64 {
        self.board.get_hash()
    }

    fn recent_moves(&self) -> &[ChessMove] {
        &self.recent
    }

    fn action_index(&self, mv: ChessMove) -> Option<usize> {
        MoveIndex::global().encode_for(mv, self)
    }

    fn validate(&self) -> Result<()> {
        if !self.board.is_sane() {
            return Err(Error::InvalidPosition(format!(
                "board failed sanity checks: {}",
                self.fen()
            )));
        }
        Ok(())
    }
}
