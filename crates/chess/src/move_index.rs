//! Fixed-size move encoding for the oracle's policy vector.
//!
//! Every move is identified by its origin square and one of 73 move planes:
//!
//! | Planes | Class | Encoding |
//! |---|---|---|
//! | 0-55 | sliding step | `direction * 7 + (distance - 1)` |
//! | 56-63 | knight jump | index into [`KNIGHT_JUMPS`] |
//! | 64-72 | promotion | `(file_delta + 1) * 3 + kind`, kind in queen/rook/bishop |
//!
//! The flat index is `origin * 73 + plane` where `origin = rank * 8 + file`,
//! giving 4672 slots of which 1858 are reachable on an empty board.
//!
//! Promotion planes only exist for origins on the seventh rank. To give both
//! colours the same slots, moves are encoded from the mover's perspective:
//! with `Color::Black` the board is mirrored vertically before encoding and
//! after decoding. Knight under-promotions have no plane of their own; they
//! share the sliding slot of the pawn step and are told apart from plain
//! moves by [`MoveIndex::decode_for`], which can see the board.

use std::sync::OnceLock;

use chess::{ChessMove, Color, Piece, Square, ALL_SQUARES};

use crate::position::ChessPosition;

/// Number of move planes per origin square.
pub const NUM_PLANES: usize = 73;

/// Number of board squares.
pub const NUM_SQUARES: usize = 64;

/// Length of the policy vector (64 origins × 73 planes).
pub const POLICY_SIZE: usize = NUM_SQUARES * NUM_PLANES;

const MAX_DISTANCE: usize = 7;
const KNIGHT_BASE: usize = 56;
const PROMOTION_BASE: usize = 64;

/// Rank index (0-based) a pawn promotes from, in the mover's orientation.
const PROMOTION_RANK: i8 = 6;

/// Sliding directions as (Δrank, Δfile).
///
/// Index 4 is one rank forward on the same file, so e2e4 lands on plane
/// `4 * 7 + 1 = 29`.
pub const DIRECTIONS: [(i8, i8); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Knight jumps as (Δrank, Δfile).
pub const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

/// Pieces with a promotion plane, in plane order.
pub const PROMOTION_PIECES: [Piece; 3] = [Piece::Queen, Piece::Rook, Piece::Bishop];

/// The geometric class of a move, resolved once per encode or decode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveClass {
    Sliding { direction: usize, distance: usize },
    Knight { jump: usize },
    Promotion { file_delta: i8, kind: usize },
}

impl MoveClass {
    /// Plane number in `0..NUM_PLANES`.
    pub fn plane(self) -> usize {
        match self {
            MoveClass::Sliding {
                direction,
                distance,
            } => direction * MAX_DISTANCE + (distance - 1),
            MoveClass::Knight { jump } => KNIGHT_BASE + jump,
            MoveClass::Promotion { file_delta, kind } => {
                PROMOTION_BASE + (file_delta + 1) as usize * PROMOTION_PIECES.len() + kind
            }
        }
    }

    /// Inverse of [`MoveClass::plane`].
    pub fn from_plane(plane: usize) -> Option<Self> {
        match plane {
            p if p < KNIGHT_BASE => Some(MoveClass::Sliding {
                direction: p / MAX_DISTANCE,
                distance: p % MAX_DISTANCE + 1,
            }),
            p if p < PROMOTION_BASE => Some(MoveClass::Knight {
                jump: p - KNIGHT_BASE,
            }),
            p if p < NUM_PLANES => {
                let offset = p - PROMOTION_BASE;
                Some(MoveClass::Promotion {
                    file_delta: (offset / PROMOTION_PIECES.len()) as i8 - 1,
                    kind: offset % PROMOTION_PIECES.len(),
                })
            }
            _ => None,
        }
    }

    /// Displacement as (Δrank, Δfile).
    pub fn delta(self) -> (i8, i8) {
        match self {
            MoveClass::Sliding {
                direction,
                distance,
            } => {
                let (dr, df) = DIRECTIONS[direction];
                (dr * distance as i8, df * distance as i8)
            }
            MoveClass::Knight { jump } => KNIGHT_JUMPS[jump],
            MoveClass::Promotion { file_delta, .. } => (1, file_delta),
        }
    }

    /// Promotion piece carried by the plane, if any.
    pub fn promotion(self) -> Option<Piece> {
        match self {
            MoveClass::Promotion { kind, .. } => Some(PROMOTION_PIECES[kind]),
            _ => None,
        }
    }

    /// Work out the class from a move's geometry.
    fn classify(from_rank: i8, drank: i8, dfile: i8, promotion: Option<Piece>) -> Option<Self> {
        let pawn_step = from_rank == PROMOTION_RANK && drank == 1 && dfile.abs() <= 1;

        match promotion {
            None => Self::knight(drank, dfile).or_else(|| Self::sliding(drank, dfile)),
            Some(Piece::Knight) if pawn_step => Self::sliding(drank, dfile),
            Some(piece) if pawn_step => {
                let kind = PROMOTION_PIECES.iter().position(|&p| p == piece)?;
                Some(MoveClass::Promotion {
                    file_delta: dfile,
                    kind,
                })
            }
            Some(_) => None,
        }
    }

    fn knight(drank: i8, dfile: i8) -> Option<Self> {
        KNIGHT_JUMPS
            .iter()
            .position(|&jump| jump == (drank, dfile))
            .map(|jump| MoveClass::Knight { jump })
    }

    fn sliding(drank: i8, dfile: i8) -> Option<Self> {
        let straight = drank == 0 || dfile == 0;
        let diagonal = drank.abs() == dfile.abs();
        if (drank, dfile) == (0, 0) || !(straight || diagonal) {
            return None;
        }
        let unit = (drank.signum(), dfile.signum());
        let direction = DIRECTIONS.iter().position(|&d| d == unit)?;
        let distance = drank.abs().max(dfile.abs()) as usize;
        Some(MoveClass::Sliding {
            direction,
            distance,
        })
    }
}

/// Destination stored in the forward table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Slot {
    to: u8,
    promotion: Option<Piece>,
}

/// Bijection between moves and policy-vector slots.
///
/// The forward table (origin × plane → destination) is built once in
/// [`MoveIndex::new`]; decoding is a table lookup and encoding derives the
/// plane from the move's geometry, then checks it against the table.
#[derive(Clone, Debug)]
pub struct MoveIndex {
    slots: Vec<Option<Slot>>,
}

impl MoveIndex {
    /// Build the forward table.
    pub fn new() -> Self {
        let mut slots = vec![None; POLICY_SIZE];

        for origin in 0..NUM_SQUARES {
            let rank = (origin / 8) as i8;
            let file = (origin % 8) as i8;

            for plane in 0..NUM_PLANES {
                let Some(class) = MoveClass::from_plane(plane) else {
                    continue;
                };
                if class.promotion().is_some() && rank != PROMOTION_RANK {
                    continue;
                }

                let (dr, df) = class.delta();
                let (to_rank, to_file) = (rank + dr, file + df);
                if !(0..8).contains(&to_rank) || !(0..8).contains(&to_file) {
                    continue;
                }

                slots[origin * NUM_PLANES + plane] = Some(Slot {
                    to: (to_rank * 8 + to_file) as u8,
                    promotion: class.promotion(),
                });
            }
        }

        Self { slots }
    }

    /// Shared instance, built on first use.
    pub fn global() -> &'static MoveIndex {
        static INDEX: OnceLock<MoveIndex> = OnceLock::new();
        INDEX.get_or_init(MoveIndex::new)
    }

    /// Number of slots that hold a move.
    #[cfg(test)]
    fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Flat index of `mv` as seen by `perspective`, or `None` if the move has
    /// no slot (wrong geometry, promotion off the seventh rank, promotion to
    /// king or pawn).
    pub fn encode(&self, mv: ChessMove, perspective: Color) -> Option<usize> {
        let from = oriented(mv.get_source().to_index(), perspective);
        let to = oriented(mv.get_dest().to_index(), perspective);

        let from_rank = (from / 8) as i8;
        let drank = (to / 8) as i8 - from_rank;
        let dfile = (to % 8) as i8 - (from % 8) as i8;

        let class = MoveClass::classify(from_rank, drank, dfile, mv.get_promotion())?;
        let index = from * NUM_PLANES + class.plane();

        let slot = self.slots[index]?;
        (slot.to as usize == to && slot.promotion == class.promotion()).then_some(index)
    }

    /// Move stored at `index` as seen by `perspective`, or `None` for indices
    /// outside the table or slots that lead off the board.
    ///
    /// Knight under-promotions come back as plain pawn steps; use
    /// [`MoveIndex::decode_for`] when a position is at hand.
    pub fn decode(&self, index: usize, perspective: Color) -> Option<ChessMove> {
        let slot = (*self.slots.get(index)?)?;
        let from = oriented(index / NUM_PLANES, perspective);
        let to = oriented(slot.to as usize, perspective);
        Some(ChessMove::new(square(from), square(to), slot.promotion))
    }

    /// Encode from the perspective of the side to move in `position`.
    pub fn encode_for(&self, mv: ChessMove, position: &ChessPosition) -> Option<usize> {
        self.encode(mv, position.color_to_move())
    }

    /// Decode for the side to move in `position`, restoring knight
    /// under-promotions from the piece on the origin square.
    pub fn decode_for(&self, index: usize, position: &ChessPosition) -> Option<ChessMove> {
        let color = position.color_to_move();
        let mv = self.decode(index, color)?;

        let board = position.board();
        let source = mv.get_source();
        let last_rank = match color {
            Color::White => 7,
            Color::Black => 0,
        };
        let pawn_reaches_last_rank = mv.get_promotion().is_none()
            && board.piece_on(source) == Some(Piece::Pawn)
            && board.color_on(source) == Some(color)
            && mv.get_dest().get_rank().to_index() == last_rank;

        if pawn_reaches_last_rank {
            return Some(ChessMove::new(source, mv.get_dest(), Some(Piece::Knight)));
        }
        Some(mv)
    }
}

impl Default for MoveIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirror a square index vertically for Black.
#[inline]
fn oriented(square_index: usize, perspective: Color) -> usize {
    match perspective {
        Color::White => square_index,
        Color::Black => square_index ^ 56,
    }
}

#[inline]
fn square(index: usize) -> Square {
    ALL_SQUARES[index]
}
