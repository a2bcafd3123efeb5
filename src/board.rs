/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Precomputed attack tables for every piece.
mod attacks;

/// A 64-bit set of squares.
mod bitboard;

/// Legal and pseudo-legal move generation.
mod movegen;

/// Compact 16-bit move encoding.
mod moves;

/// Attack queries, pins, and the in-check cache.
mod oracle;

/// Move path enumeration, for debugging move generation.
mod perft;

/// Colors, piece kinds, and colored pieces.
mod piece;

/// The mutable game state and its make/unmake routines.
mod position;

/// Compile-time pseudo-random numbers for hashing.
mod prng;

/// Squares, files, and ranks.
mod square;

/// Useful constants.
mod utils;

/// Zobrist hashing of positions.
mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use movegen::*;
pub use moves::*;
pub use oracle::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use utils::*;
pub use zobrist::*;
