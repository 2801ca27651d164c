//! Feature planes for the evaluator's input.
//!
//! Converts a chess position to a 22-plane representation matching the
//! training pipeline format: piece placement, game state flags and the two
//! most recent moves.

use chess::{BitBoard, ChessMove, Color, Piece};

use crate::position::ChessPosition;

/// Number of planes in the feature tensor.
pub const NUM_FEATURE_PLANES: usize = 22;

/// Total number of floats in the feature tensor (22 planes × 64 squares).
pub const FEATURE_SIZE: usize = NUM_FEATURE_PLANES * 64;

/// Plane indices for the feature tensor.
pub mod planes {
    /// First piece plane; white pawn..king are 0-5, black 6-11.
    pub const PIECES: usize = 0;
    pub const WHITE_TO_MOVE: usize = 12;
    pub const CASTLING_WK: usize = 13;
    pub const CASTLING_WQ: usize = 14;
    pub const CASTLING_BK: usize = 15;
    pub const CASTLING_BQ: usize = 16;
    /// Square a pawn passes over when it may be captured en passant.
    pub const EN_PASSANT: usize = 17;
    pub const IN_CHECK: usize = 18;
    pub const HALFMOVE: usize = 19;
    /// From and to squares of the last two moves, oldest first; a single
    /// move played so far lands here.
    pub const LAST_MOVES: usize = 20;
}

const PIECE_ORDER: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

/// Encode a position into the 22-plane feature tensor.
///
/// The output is a flat Vec<f32> with 1408 elements, laid out as:
/// `[plane_0_sq_0, plane_0_sq_1, ..., plane_0_sq_63, plane_1_sq_0, ...]`
///
/// Each square index corresponds to: `rank * 8 + file` (a1=0, h1=7, ..., h8=63).
pub fn encode(position: &ChessPosition) -> Vec<f32> {
    let mut features = vec![0.0f32; FEATURE_SIZE];
    let board = position.board();

    for (color_offset, color) in [(0, Color::White), (6, Color::Black)] {
        for (i, &piece) in PIECE_ORDER.iter().enumerate() {
            let bitboard = board.pieces(piece) & board.color_combined(color);
            encode_bitboard(&mut features, planes::PIECES + color_offset + i, bitboard);
        }
    }

    if board.side_to_move() == Color::White {
        fill_plane(&mut features, planes::WHITE_TO_MOVE, 1.0);
    }

    let white = board.castle_rights(Color::White);
    let black = board.castle_rights(Color::Black);
    let castling = [
        (planes::CASTLING_WK, white.has_kingside()),
        (planes::CASTLING_WQ, white.has_queenside()),
        (planes::CASTLING_BK, black.has_kingside()),
        (planes::CASTLING_BQ, black.has_queenside()),
    ];
    for (plane, allowed) in castling {
        if allowed {
            fill_plane(&mut features, plane, 1.0);
        }
    }

    // The rules crate reports the capturable pawn; mark the square behind it
    if let Some(target) = board
        .en_passant()
        .and_then(|pawn| pawn.forward(board.side_to_move()))
    {
        features[planes::EN_PASSANT * 64 + target.to_index()] = 1.0;
    }

    if position.is_check() {
        fill_plane(&mut features, planes::IN_CHECK, 1.0);
    }

    let halfmove = (position.halfmove_clock() as f32 / 100.0).min(1.0);
    fill_plane(&mut features, planes::HALFMOVE, halfmove);

    for (k, mv) in position.last_moves().iter().enumerate() {
        mark_move(&mut features, planes::LAST_MOVES + k, *mv);
    }

    features
}

/// Set 1.0 for each set bit in the bitboard.
#[inline]
fn encode_bitboard(features: &mut [f32], plane: usize, bitboard: BitBoard) {
    let base = plane * 64;
    for square in bitboard {
        features[base + square.to_index()] = 1.0;
    }
}

#[inline]
fn fill_plane(features: &mut [f32], plane: usize, value: f32) {
    let base = plane * 64;
    features[base..base + 64].fill(value);
}

#[inline]
fn mark_move(features: &mut [f32], plane: usize, mv: ChessMove) {
    let base = plane * 64;
    features[base + mv.get_source().to_index()] = 1.0;
    features[base + mv.get_dest().to_index()] = 1.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(features: &[f32], plane: usize) -> &[f32] {
        &features[plane * 64..(plane + 1) * 64]
    }

    #[test]
    fn test_feature_size() {
        let features = encode(&ChessPosition::starting());
        assert_eq!(features.len(), FEATURE_SIZE);
        assert_eq!(features.len(), 22 * 64);
    }

    #[test]
    fn test_starting_position_pieces() {
        let features = encode(&ChessPosition::starting());

        // White pawns on rank 2 (squares 8-15)
        let white_pawns = plane(&features, planes::PIECES);
        assert!(white_pawns[8..16].iter().all(|&v| v == 1.0));
        assert!(white_pawns[0..8].iter().all(|&v| v == 0.0));

        // Black pawns on rank 7 (squares 48-55)
        let black_pawns = plane(&features, planes::PIECES + 6);
        assert!(black_pawns[48..56].iter().all(|&v| v == 1.0));

        // Kings on e1 and e8
        assert_eq!(plane(&features, planes::PIECES + 5)[4], 1.0);
        assert_eq!(plane(&features, planes::PIECES + 11)[60], 1.0);

        let total: f32 = features[..12 * 64].iter().sum();
        assert_eq!(total, 32.0);
    }

    #[test]
    fn test_side_to_move_and_castling() {
        let start = ChessPosition::starting();
        let features = encode(&start);
        assert!(plane(&features, planes::WHITE_TO_MOVE).iter().all(|&v| v == 1.0));
        for p in planes::CASTLING_WK..=planes::CASTLING_BQ {
            assert_eq!(plane(&features, p)[0], 1.0);
        }

        let after = start.play_uci("e2e4").unwrap();
        let features = encode(&after);
        assert!(plane(&features, planes::WHITE_TO_MOVE).iter().all(|&v| v == 0.0));

        let no_castling =
            ChessPosition::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w - - 0 1").unwrap();
        let features = encode(&no_castling);
        for p in planes::CASTLING_WK..=planes::CASTLING_BQ {
            assert_eq!(plane(&features, p)[0], 0.0);
        }
    }

    #[test]
    fn test_in_check_plane() {
        let checked = ChessPosition::from_fen("4k3/8/8/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        let features = encode(&checked);
        assert!(plane(&features, planes::IN_CHECK).iter().all(|&v| v == 1.0));

        let quiet = encode(&ChessPosition::starting());
        assert!(plane(&quiet, planes::IN_CHECK).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_halfmove_plane() {
        let pos = ChessPosition::from_fen("8/8/8/8/8/8/8/4K2k w - - 50 100").unwrap();
        let features = encode(&pos);
        assert!((plane(&features, planes::HALFMOVE)[0] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_last_moves_planes() {
        let pos = ChessPosition::starting()
            .play_uci("e2e4")
            .unwrap()
            .play_uci("c7c5")
            .unwrap();
        let features = encode(&pos);

        // Plane 20 holds e2e4, plane 21 holds c7c5
        let older = plane(&features, planes::LAST_MOVES);
        assert_eq!(older[12], 1.0);
        assert_eq!(older[28], 1.0);
        assert_eq!(older.iter().sum::<f32>(), 2.0);

        let latest = plane(&features, planes::LAST_MOVES + 1);
        assert_eq!(latest[50], 1.0);
        assert_eq!(latest[34], 1.0);
    }

    #[test]
    fn test_single_move_fills_first_move_plane() {
        let pos = ChessPosition::starting().play_uci("g1f3").unwrap();
        let features = encode(&pos);

        let first = plane(&features, planes::LAST_MOVES);
        assert_eq!(first[6], 1.0);
        assert_eq!(first[21], 1.0);
        assert!(plane(&features, planes::LAST_MOVES + 1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_en_passant_marks_target_square() {
        let pos = ["e2e4", "a7a6", "e4e5", "d7d5"]
            .iter()
            .try_fold(ChessPosition::starting(), |pos, uci| pos.play_uci(uci))
            .unwrap();
        let features = encode(&pos);

        // d6 is the target, d5 holds the pawn that moved
        let ep = plane(&features, planes::EN_PASSANT);
        assert_eq!(ep[43], 1.0);
        assert_eq!(ep[35], 0.0);
        assert_eq!(ep.iter().sum::<f32>(), 1.0);

        let quiet = encode(&ChessPosition::starting());
        assert!(plane(&quiet, planes::EN_PASSANT).iter().all(|&v| v == 0.0));
    }
}
