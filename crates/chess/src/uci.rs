//! UCI long algebraic notation (`e2e4`, `e7e8q`).

use chess::{ChessMove, File, Piece, Rank, Square};
use lilichest_core::{Error, Result};

/// Parse a square such as `e4`.
pub fn parse_square(text: &str) -> Option<Square> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = bytes[0].checked_sub(b'a').filter(|&f| f < 8)?;
    let rank = bytes[1].checked_sub(b'1').filter(|&r| r < 8)?;
    Some(Square::make_square(
        Rank::from_index(rank as usize),
        File::from_index(file as usize),
    ))
}

/// Format a square such as `e4`.
pub fn square_name(square: Square) -> String {
    let file = (b'a' + square.get_file().to_index() as u8) as char;
    let rank = (b'1' + square.get_rank().to_index() as u8) as char;
    format!("{}{}", file, rank)
}

fn promotion_piece(c: char) -> Option<Piece> {
    match c {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

/// Parse a move in UCI notation.
///
/// Only the syntax is checked; legality depends on the position.
///
/// # Errors
/// Returns `Error::InvalidMove` for malformed text.
pub fn parse_uci(text: &str) -> Result<ChessMove> {
    let invalid = || Error::InvalidMove(format!("malformed UCI move '{}'", text));

    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(invalid());
    }
    let from = parse_square(&text[0..2]).ok_or_else(invalid)?;
    let to = parse_square(&text[2..4]).ok_or_else(invalid)?;
    let promotion = match text[4..].chars().next() {
        Some(c) => Some(promotion_piece(c).ok_or_else(invalid)?),
        None => None,
    };
    if from == to {
        return Err(invalid());
    }
    Ok(ChessMove::new(from, to, promotion))
}

/// Format a move in UCI notation.
pub fn to_uci(mv: ChessMove) -> String {
    let mut text = square_name(mv.get_source());
    text.push_str(&square_name(mv.get_dest()));
    if let Some(piece) = mv.get_promotion() {
        text.push(promotion_char(piece));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_move() {
        let mv = parse_uci("e2e4").unwrap();
        assert_eq!(mv.get_source().to_index(), 12);
        assert_eq!(mv.get_dest().to_index(), 28);
        assert_eq!(mv.get_promotion(), None);
    }

    #[test]
    fn test_parse_promotion() {
        let mv = parse_uci("a7a8n").unwrap();
        assert_eq!(mv.get_promotion(), Some(Piece::Knight));
        assert_eq!(to_uci(mv), "a7a8n");
    }

    #[test]
    fn test_round_trip() {
        for text in ["e2e4", "g8f6", "e1g1", "h2h1q", "b7c8r", "d7d8b"] {
            assert_eq!(to_uci(parse_uci(text).unwrap()), text);
        }
    }

    #[test]
    fn test_malformed() {
        for text in ["", "e2", "e2e", "e2e4qq", "i2e4", "e9e4", "e2e4k", "e2e2", "é2e4"] {
            assert!(parse_uci(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_square_names() {
        assert_eq!(parse_square("a1").map(|s| s.to_index()), Some(0));
        assert_eq!(parse_square("h8").map(|s| s.to_index()), Some(63));
        assert_eq!(square_name(parse_square("c6").unwrap()), "c6");
        assert_eq!(parse_square("c"), None);
    }
}
