//! Tiny game used by the unit tests.
//!
//! Race to five: players take turns adding 1 or 2 to a counter. Whoever
//! brings it to exactly 5 wins, so the side to move at 5 has lost. The first
//! player wins by always moving to a count of 2 or 5.

use lilichest_core::{Error, Outcome, Player, Position, Result};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Add(pub u8);

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RaceToFive {
    pub count: u8,
    pub to_move: Player,
    pub last: Vec<Add>,
}

impl RaceToFive {
    pub fn new() -> Self {
        Self::at(0, Player::First)
    }

    pub fn at(count: u8, to_move: Player) -> Self {
        Self {
            count,
            to_move,
            last: Vec::new(),
        }
    }
}

impl Position for RaceToFive {
    type Move = Add;

    const NUM_ACTIONS: usize = 2;

    fn legal_moves(&self) -> Vec<Add> {
        (1..=2)
            .filter(|k| self.count + k <= 5)
            .map(Add)
            .collect()
    }

    fn apply_move(&self, mv: Add) -> Self {
        Self {
            count: self.count + mv.0,
            to_move: self.to_move.opponent(),
            last: vec![mv],
        }
    }

    fn side_to_move(&self) -> Player {
        self.to_move
    }

    fn outcome(&self) -> Option<Outcome> {
        (self.count >= 5).then_some(Outcome::Loss)
    }

    fn structural_hash(&self) -> u64 {
        u64::from(self.count) * 2 + u64::from(self.to_move == Player::Second)
    }

    fn recent_moves(&self) -> &[Add] {
        &self.last
    }

    fn action_index(&self, mv: Add) -> Option<usize> {
        matches!(mv.0, 1 | 2).then(|| (mv.0 - 1) as usize)
    }

    fn validate(&self) -> Result<()> {
        if self.count > 5 {
            return Err(Error::InvalidPosition(format!("count {} overshoots", self.count)));
        }
        Ok(())
    }
}
