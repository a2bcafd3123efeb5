/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Board, Color, File, PieceKind, Position, Psqt, Rank, Score, Square};

/// Material of both sides in the starting position, Kings excluded.
const INITIAL_MATERIAL_VALUE: i32 = PieceKind::Pawn.value() * 16
    + PieceKind::Knight.value() * 4
    + PieceKind::Bishop.value() * 4
    + PieceKind::Rook.value() * 4
    + PieceKind::Queen.value() * 2;

/// Piece kinds that count towards material.
const MATERIAL_KINDS: [PieceKind; 5] = [
    PieceKind::Pawn,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
];

/// Evaluate `position` from the side-to-move's perspective.
///
/// This is the static evaluation used at the leaves of quiescence search.
#[inline(always)]
pub fn evaluate(position: &Position) -> Score {
    Evaluator::new(position).eval()
}

/// Tapered piece-square evaluation of a [`Position`].
///
/// Scores are relative: positive favors whichever side is asked about.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    position: &'a Position,

    /// How far the game has progressed towards an endgame, from `0` (all material on the board) to `100`.
    pub(crate) endgame_weight: i32,
}

impl<'a> Evaluator<'a> {
    #[inline(always)]
    pub fn new(position: &'a Position) -> Self {
        Self {
            position,
            endgame_weight: endgame_weight(position),
        }
    }

    /// Score for the side to move.
    #[inline(always)]
    pub fn eval(self) -> Score {
        self.eval_for(self.position.side_to_move())
    }

    /// Score for `color`, blending the middlegame and endgame tables by [`Self::endgame_weight`].
    #[inline(always)]
    pub fn eval_for(&self, color: Color) -> Score {
        let (mg, eg) = self
            .position
            .iter()
            .fold((Score::DRAW, Score::DRAW), |(mg, eg), (square, piece)| {
                let (piece_mg, piece_eg) = Psqt::evals(piece, square);
                let sign = if piece.color() == color { 1 } else { -1 };
                (mg + piece_mg * sign, eg + piece_eg * sign)
            });

        mg.lerp(eg, self.endgame_weight)
    }

    /// White-relative contribution of the piece on `square`, if there is one.
    #[inline(always)]
    fn contribution(&self, square: Square) -> Option<Score> {
        self.position.piece_at(square).map(|piece| {
            let value = Psqt::eval(piece, square, self.endgame_weight);
            Score::new(value * piece.color().negation_multiplier())
        })
    }
}

/// Prints each piece with its contribution in pawns, one rank per line, followed by the total.
impl fmt::Display for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank} ")?;

            for file in File::iter() {
                let square = Square::new(file, rank);
                match (self.position.piece_at(square), self.contribution(square)) {
                    (Some(piece), Some(value)) => {
                        write!(f, " {}{:>+6.2}", piece.char(), value.normalize())?
                    }
                    _ => write!(f, " {:>7}", ".")?,
                }
            }
            writeln!(f)?;
        }

        write!(f, "  ")?;
        for file in File::iter() {
            write!(f, " {file:>7}")?;
        }
        writeln!(f)?;

        let stm = self.position.side_to_move();
        writeln!(f, "\nphase: {}% endgame", self.endgame_weight)?;
        write!(f, "{} to move: {}", stm.name(), self.eval_for(stm))
    }
}

/// Material on `board`, Kings excluded.
#[inline(always)]
fn material_remaining(board: &Board) -> i32 {
    MATERIAL_KINDS.into_iter().fold(0, |score, kind| {
        score + board.kind(kind).population() as i32 * kind.value()
    })
}

/// Percentage of the starting material that has left the board, in `[0, 100]`.
#[inline(always)]
fn endgame_weight(board: &Board) -> i32 {
    let removed = (INITIAL_MATERIAL_VALUE - material_remaining(board)).max(0);
    removed * 100 / INITIAL_MATERIAL_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_is_balanced() {
        let pos = Position::default();
        assert_eq!(evaluate(&pos), Score::DRAW);
        assert_eq!(endgame_weight(&pos), 0);
    }

    #[test]
    fn test_eval_is_side_relative() {
        // White is up a Queen
        let white = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();

        assert!(evaluate(&white) > Score::DRAW);
        assert_eq!(evaluate(&white), -evaluate(&black));
    }

    #[test]
    fn test_endgame_weight_grows() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(endgame_weight(&pos) > 80);
    }
}
