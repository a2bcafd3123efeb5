/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{generate_legal, Color, Position};

/// The state of a game after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The game continues.
    Running,

    /// The side to move has no legal moves and is in check.
    Checkmate { winner: Color },

    /// The side to move has no legal moves but is not in check.
    Stalemate,

    /// The current position has occurred three times.
    DrawByRepetition,

    /// One hundred plies have passed without a capture or a pawn move.
    DrawByFiftyMoves,

    /// Neither side has the material to deliver mate.
    DrawByInsufficientMaterial,
}

impl Outcome {
    /// Returns `true` if the game has ended.
    #[inline(always)]
    pub const fn is_over(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Returns `true` if the game ended in a draw of any kind.
    #[inline(always)]
    pub const fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Stalemate
                | Self::DrawByRepetition
                | Self::DrawByFiftyMoves
                | Self::DrawByInsufficientMaterial
        )
    }

    /// The winning side, if there is one.
    #[inline(always)]
    pub const fn winner(&self) -> Option<Color> {
        match self {
            Self::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Checkmate { winner } => write!(f, "checkmate, {} wins", winner.name()),
            Self::Stalemate => write!(f, "draw by stalemate"),
            Self::DrawByRepetition => write!(f, "draw by threefold repetition"),
            Self::DrawByFiftyMoves => write!(f, "draw by the fifty-move rule"),
            Self::DrawByInsufficientMaterial => write!(f, "draw by insufficient material"),
        }
    }
}

/// Classifies `position`, given how many legal moves the side to move has.
///
/// Mate and stalemate take priority over repetition, which takes priority over the fifty-move rule,
/// which takes priority over insufficient material.
pub fn classify(position: &Position, legal_moves: usize) -> Outcome {
    if legal_moves == 0 {
        return if position.in_check() {
            Outcome::Checkmate {
                winner: position.side_to_move().opponent(),
            }
        } else {
            Outcome::Stalemate
        };
    }

    if position.is_repetition(3) {
        Outcome::DrawByRepetition
    } else if position.can_draw_by_fifty() {
        Outcome::DrawByFiftyMoves
    } else if position.has_insufficient_material() {
        Outcome::DrawByInsufficientMaterial
    } else {
        Outcome::Running
    }
}

/// Generates the legal moves of `position` and classifies it.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let mut pos = Position::default();
/// assert_eq!(evaluate_outcome(&mut pos), Outcome::Running);
/// ```
pub fn evaluate_outcome(position: &mut Position) -> Outcome {
    let legal_moves = generate_legal(position).len();
    classify(position, legal_moves)
}
