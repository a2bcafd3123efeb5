/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, ray_between, rook_attacks,
    Bitboard, Board, Color, Position, Square, ZobristKey,
};

/// All pieces of `by` that attack `square`, treating `occupied` as the set of blockers.
///
/// Passing a custom occupancy lets callers see "through" a piece, such as a King stepping along a slider's ray.
#[inline(always)]
pub fn attackers_to(board: &Board, square: Square, by: Color, occupied: Bitboard) -> Bitboard {
    let pawns = pawn_attacks(square, by.opponent()) & board.pawns(by);
    let knights = knight_attacks(square) & board.knights(by);
    let kings = king_attacks(square) & board.king(by);
    let orthogonal = rook_attacks(square, occupied) & board.orthogonal_sliders(by);
    let diagonal = bishop_attacks(square, occupied) & board.diagonal_sliders(by);

    pawns | knights | kings | orthogonal | diagonal
}

/// Returns `true` if any piece of `by` attacks `square` in `position`.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let pos = Position::default();
/// assert!(is_attacked(&pos, Square::F3, Color::White));
/// assert!(!is_attacked(&pos, Square::E4, Color::White));
/// assert!(is_attacked(&pos, Square::F6, Color::Black));
/// ```
#[inline(always)]
pub fn is_attacked(position: &Position, square: Square, by: Color) -> bool {
    attackers_to(position.board(), square, by, position.occupied()).is_nonempty()
}

/// Returns `true` if `side`'s King is attacked.
#[inline(always)]
pub fn is_in_check(position: &Position, side: Color) -> bool {
    position.is_in_check(side)
}

/// Enemy pieces giving check to the side to move.
#[inline(always)]
pub fn checkers(position: &Position) -> Bitboard {
    let color = position.side_to_move();
    attackers_to(
        position.board(),
        position.king_square(color),
        color.opponent(),
        position.occupied(),
    )
}

/// Pieces of `color` that are absolutely pinned to their own King.
///
/// A piece is pinned if it is the only piece between its King and an enemy slider aligned with that King.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let pos: Position = "4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1".parse().unwrap();
/// assert_eq!(pinned(&pos, Color::White), Bitboard::from_square(Square::E2));
/// ```
pub fn pinned(position: &Position, color: Color) -> Bitboard {
    let king = position.king_square(color);
    let enemy = color.opponent();
    let board = position.board();

    // Enemy sliders that would attack the King if nothing stood in the way
    let snipers = (rook_attacks(king, Bitboard::EMPTY_BOARD) & board.orthogonal_sliders(enemy))
        | (bishop_attacks(king, Bitboard::EMPTY_BOARD) & board.diagonal_sliders(enemy));

    let mut pinned = Bitboard::EMPTY_BOARD;
    for sniper in snipers {
        let between = ray_between(king, sniper) & board.occupied();
        if between.population() == 1 {
            pinned |= between & board.color(color);
        }
    }

    pinned
}

/// One cached answer of [`CheckCache`].
#[derive(Clone, Copy, Debug)]
struct CheckEntry {
    key: ZobristKey,
    in_check: [bool; Color::COUNT],
}

/// A small, fixed-capacity memo of "is either side in check?", keyed by [`ZobristKey`].
///
/// Direct-mapped: each key has exactly one slot, and a new key simply overwrites whatever was there.
#[derive(Clone, Debug)]
pub struct CheckCache {
    entries: Box<[Option<CheckEntry>]>,
    hits: u64,
    misses: u64,
}

impl CheckCache {
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Creates a cache holding `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity.max(1)].into_boxed_slice(),
            hits: 0,
            misses: 0,
        }
    }

    #[inline(always)]
    fn index(&self, key: ZobristKey) -> usize {
        (key.inner() % self.entries.len() as u64) as usize
    }

    /// Returns `true` if `side` is in check in `position`, computing and caching both sides on a miss.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let pos: Position = "4k3/8/8/8/8/8/8/r3K3 w - - 0 1".parse().unwrap();
    /// let mut cache = CheckCache::default();
    /// assert!(cache.is_in_check(&pos, Color::White));
    /// assert!(!cache.is_in_check(&pos, Color::Black));
    /// assert_eq!(cache.hits(), 1);
    /// ```
    pub fn is_in_check(&mut self, position: &Position, side: Color) -> bool {
        let key = position.key();
        let index = self.index(key);

        if let Some(entry) = self.entries[index].filter(|entry| entry.key == key) {
            self.hits += 1;
            return entry.in_check[side];
        }

        self.misses += 1;
        let in_check = [
            position.is_in_check(Color::White),
            position.is_in_check(Color::Black),
        ];
        self.entries[index] = Some(CheckEntry { key, in_check });

        in_check[side]
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.hits = 0;
        self.misses = 0;
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[inline(always)]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for CheckCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
