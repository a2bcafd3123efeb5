/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{File, PieceKind, Square};

/// Upper bound on the number of moves (pseudo-legal included) generated for a single position.
///
/// The most legal moves known in any position is 218; pseudo-legal lists can exceed that slightly.
pub const MAX_NUM_MOVES: usize = 256;

/// A list of moves stored inline, without heap allocation.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The special semantics of a move, stored in the top four bits of a [`Move`].
///
/// Flag values follow <https://www.chessprogramming.org/Encoding_Moves#From-To_Based>,
/// with the otherwise-unused value `6` taken by the null move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum MoveKind {
    Quiet = 0,
    PawnDoublePush = 1,
    /// King-side castling. The destination is the castling Rook's original square.
    ShortCastle = 2,
    /// Queen-side castling. The destination is the castling Rook's original square.
    LongCastle = 3,
    Capture = 4,
    /// The captured Pawn sits behind the destination square.
    EnPassantCapture = 5,
    /// Passes the turn without moving a piece.
    Null = 6,
    PromoteKnight = 8,
    PromoteBishop = 9,
    PromoteRook = 10,
    PromoteQueen = 11,
    CaptureAndPromoteKnight = 12,
    CaptureAndPromoteBishop = 13,
    CaptureAndPromoteRook = 14,
    CaptureAndPromoteQueen = 15,
}

impl MoveKind {
    /// A (possibly capturing) promotion to `promotion`.
    ///
    /// Anything other than a Knight, Bishop, or Rook promotes to a Queen.
    #[inline(always)]
    pub const fn promotion(promotion: PieceKind, is_capture: bool) -> Self {
        match (promotion, is_capture) {
            (PieceKind::Knight, false) => Self::PromoteKnight,
            (PieceKind::Bishop, false) => Self::PromoteBishop,
            (PieceKind::Rook, false) => Self::PromoteRook,
            (_, false) => Self::PromoteQueen,
            (PieceKind::Knight, true) => Self::CaptureAndPromoteKnight,
            (PieceKind::Bishop, true) => Self::CaptureAndPromoteBishop,
            (PieceKind::Rook, true) => Self::CaptureAndPromoteRook,
            (_, true) => Self::CaptureAndPromoteQueen,
        }
    }

    #[inline(always)]
    const fn from_flag(flag: u16) -> Self {
        match flag {
            0 => Self::Quiet,
            1 => Self::PawnDoublePush,
            2 => Self::ShortCastle,
            3 => Self::LongCastle,
            4 => Self::Capture,
            5 => Self::EnPassantCapture,
            8 => Self::PromoteKnight,
            9 => Self::PromoteBishop,
            10 => Self::PromoteRook,
            11 => Self::PromoteQueen,
            12 => Self::CaptureAndPromoteKnight,
            13 => Self::CaptureAndPromoteBishop,
            14 => Self::CaptureAndPromoteRook,
            15 => Self::CaptureAndPromoteQueen,
            _ => Self::Null,
        }
    }
}

/// A move packed into 16 bits: source square in bits 0-5, destination in bits 6-11, and a [`MoveKind`] flag in bits 12-15.
///
/// The flag alone decides special semantics. Castling is stored as "King takes own Rook",
/// so the destination square is the Rook's starting square; see [`Move::to_uci`] for the King-destination form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    const DST_BITS: u16 = 6;
    const FLG_BITS: u16 = 12;

    const FLAG_CAPTURE: u16 = 0b0100;
    const FLAG_PROMOTION: u16 = 0b1000;

    /// Creates a new [`Move`].
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Move, MoveKind, Square};
    /// let mv = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
    /// assert_eq!(mv.from(), Square::E2);
    /// assert_eq!(mv.to(), Square::E4);
    /// assert_eq!(mv.kind(), MoveKind::PawnDoublePush);
    /// assert_eq!(mv.to_string(), "e2e4");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self((kind as u16) << Self::FLG_BITS | (to.0 as u16) << Self::DST_BITS | from.0 as u16)
    }

    /// The null move, which only passes the turn.
    #[inline(always)]
    pub const fn null() -> Self {
        Self::new(Square::A1, Square::A1, MoveKind::Null)
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square((self.0 & Self::SRC_MASK) as u8)
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as u8)
    }

    #[inline(always)]
    const fn flag(&self) -> u16 {
        self.0 >> Self::FLG_BITS
    }

    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        MoveKind::from_flag(self.flag())
    }

    /// The raw 16 bits of this move.
    #[inline(always)]
    pub const fn bits(&self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.flag() == MoveKind::Null as u16
    }

    /// Returns `true` if this move removes an enemy piece, including en passant.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.flag() & Self::FLAG_CAPTURE != 0 && !self.is_null()
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.flag() & Self::FLAG_PROMOTION != 0
    }

    /// Returns `true` if this move neither captures nor promotes.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        self.flag() == MoveKind::EnPassantCapture as u16
    }

    #[inline(always)]
    pub const fn is_pawn_double_push(&self) -> bool {
        self.flag() == MoveKind::PawnDoublePush as u16
    }

    #[inline(always)]
    pub const fn is_short_castle(&self) -> bool {
        self.flag() == MoveKind::ShortCastle as u16
    }

    #[inline(always)]
    pub const fn is_long_castle(&self) -> bool {
        self.flag() == MoveKind::LongCastle as u16
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.is_short_castle() || self.is_long_castle()
    }

    /// The piece a Pawn becomes, if this is a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        if !self.is_promotion() {
            return None;
        }

        Some(match self.flag() & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    /// For castling moves, the final squares of the King and Rook, in that order.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Move, MoveKind, Square};
    /// let castle = Move::new(Square::E8, Square::A8, MoveKind::LongCastle);
    /// assert_eq!(castle.castling_destinations(), Some((Square::C8, Square::D8)));
    /// ```
    #[inline(always)]
    pub const fn castling_destinations(&self) -> Option<(Square, Square)> {
        let rank = self.from().rank();
        if self.is_short_castle() {
            Some((Square::new(File::G, rank), Square::new(File::F, rank)))
        } else if self.is_long_castle() {
            Some((Square::new(File::C, rank), Square::new(File::D, rank)))
        } else {
            None
        }
    }

    /// Coordinate text for this move, like `e2e4` or `e7e8q`.
    ///
    /// Castling is converted from the internal "King takes Rook" form to the King's destination (`e1g1`),
    /// unless `chess960` is set, in which case the Rook's square is kept (`e1h1`).
    /// The null move is written `0000`.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Move, MoveKind, Square};
    /// let castle = Move::new(Square::E1, Square::H1, MoveKind::ShortCastle);
    /// assert_eq!(castle.to_uci(false), "e1g1");
    /// assert_eq!(castle.to_uci(true), "e1h1");
    /// ```
    pub fn to_uci(&self, chess960: bool) -> String {
        if self.is_null() {
            return String::from("0000");
        }

        let to = match self.castling_destinations() {
            Some((king_to, _)) if !chess960 => king_to,
            _ => self.to(),
        };

        match self.promotion() {
            Some(promotion) => format!("{}{to}{}", self.from(), promotion.char()),
            None => format!("{}{to}", self.from()),
        }
    }
}

impl fmt::Display for Move {
    /// Standard coordinate notation; use `{:#}` for the Chess960 castling form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci(f.alternate()))
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:#} ({:?})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let quiet = Move::new(Square::G1, Square::F3, MoveKind::Quiet);
        assert!(quiet.is_quiet());
        assert!(!quiet.is_capture());

        let capture = Move::new(Square::E4, Square::D5, MoveKind::Capture);
        assert!(capture.is_capture());
        assert!(!capture.is_quiet());

        let ep = Move::new(Square::E5, Square::D6, MoveKind::EnPassantCapture);
        assert!(ep.is_capture());
        assert!(ep.is_en_passant());

        let null = Move::null();
        assert!(null.is_null());
        assert!(!null.is_capture());
        assert!(null.is_quiet());
        assert_eq!(null.to_string(), "0000");
    }

    #[test]
    fn test_promotions() {
        for kind in PieceKind::promotions() {
            for is_capture in [false, true] {
                let mv = Move::new(
                    Square::B7,
                    Square::A8,
                    MoveKind::promotion(kind, is_capture),
                );
                assert_eq!(mv.promotion(), Some(kind));
                assert_eq!(mv.is_capture(), is_capture);
                assert!(!mv.is_quiet());
            }
        }

        let mv = Move::new(Square::B7, Square::B8, MoveKind::PromoteKnight);
        assert_eq!(mv.to_string(), "b7b8n");
    }

    #[test]
    fn test_castling_uci_forms() {
        let long = Move::new(Square::E1, Square::A1, MoveKind::LongCastle);
        assert_eq!(long.to_string(), "e1c1");
        assert_eq!(format!("{long:#}"), "e1a1");
        assert!(long.is_castle());
        assert!(long.is_quiet());
    }
}
