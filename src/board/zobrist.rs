/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{prng::XoShiRo, Board, CastlingRights, Color, File, Piece, Square};

/// Hash keys for every component of a position, generated once at compile time.
static ZOBRIST_TABLE: ZobristTable = ZobristTable::new();

/// An incrementally-updated [Zobrist hash](https://www.chessprogramming.org/Zobrist_Hashing) of a position.
///
/// Every component is folded in with XOR, so hashing the same component twice removes it again.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes a key from scratch out of the components of a position.
    pub fn from_parts(
        board: &Board,
        ep_square: Option<Square>,
        castling_rights: CastlingRights,
        side_to_move: Color,
    ) -> Self {
        let mut key = Self::default();

        for (square, piece) in board.iter() {
            key.hash_piece(square, piece);
        }

        key.hash_ep_square(ep_square);
        key.hash_castling_rights(castling_rights);

        if side_to_move.is_black() {
            key.hash_side_to_move();
        }

        key
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Toggles `piece` on `square`.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let mut key = ZobristKey::default();
    /// key.hash_piece(Square::D7, Piece::BLACK_PAWN);
    /// assert_ne!(key, ZobristKey::default());
    ///
    /// key.hash_piece(Square::D7, Piece::BLACK_PAWN);
    /// assert_eq!(key, ZobristKey::default());
    /// ```
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.0 ^= ZOBRIST_TABLE.pieces[square][piece];
    }

    /// Toggles the file of the en passant target, if there is one.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, ep_square: Option<Square>) {
        if let Some(square) = ep_square {
            self.0 ^= ZOBRIST_TABLE.ep_files[square.file().index()];
        }
    }

    /// Toggles a full set of castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: CastlingRights) {
        self.0 ^= ZOBRIST_TABLE.castling[rights.index()];
    }

    /// Toggles the side-to-move. Called once per move made or unmade.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self) {
        self.0 ^= ZOBRIST_TABLE.black_to_move;
    }
}

impl fmt::Display for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

struct ZobristTable {
    pieces: [[u64; Piece::COUNT]; Square::COUNT],
    ep_files: [u64; File::COUNT],
    castling: [u64; CastlingRights::COUNT],
    black_to_move: u64,
}

impl ZobristTable {
    const fn new() -> Self {
        let mut pieces = [[0; Piece::COUNT]; Square::COUNT];
        let mut ep_files = [0; File::COUNT];
        let mut castling = [0; CastlingRights::COUNT];

        let mut prng = XoShiRo::new();
        let mut key;

        let mut i = 0;
        while i < Square::COUNT {
            let mut j = 0;
            while j < Piece::COUNT {
                (key, prng) = prng.next_const();
                pieces[i][j] = key;
                j += 1;
            }
            i += 1;
        }

        i = 0;
        while i < File::COUNT {
            (key, prng) = prng.next_const();
            ep_files[i] = key;
            i += 1;
        }

        // No rights at all hashes to zero
        i = 1;
        while i < CastlingRights::COUNT {
            (key, prng) = prng.next_const();
            castling[i] = key;
            i += 1;
        }

        let (black_to_move, _) = prng.next_const();

        Self {
            pieces,
            ep_files,
            castling,
            black_to_move,
        }
    }
}
