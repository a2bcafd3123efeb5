/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, Color, Piece, PieceKind, Square};

/// Deltas `(file, rank)` of the eight ray directions.
///
/// The first four directions walk towards higher square indices, so the nearest blocker on them is the LSB.
/// The last four walk towards lower indices, so the nearest blocker is the MSB.
const RAY_DELTAS: [(i8, i8); 8] = [
    /* Increasing */
    (0, 1),  // North
    (1, 1),  // Northeast
    (1, 0),  // East
    (-1, 1), // Northwest
    /* Decreasing */
    (0, -1),  // South
    (-1, -1), // Southwest
    (-1, 0),  // West
    (1, -1),  // Southeast
];

const NORTH: usize = 0;
const NORTHEAST: usize = 1;
const EAST: usize = 2;
const NORTHWEST: usize = 3;
const SOUTH: usize = 4;
const SOUTHWEST: usize = 5;
const WEST: usize = 6;
const SOUTHEAST: usize = 7;

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Unblocked rays, indexed by `[direction][square]`. The origin square is excluded.
static RAYS: [[u64; Square::COUNT]; 8] = UNBLOCKED_RAYS;

const UNBLOCKED_RAYS: [[u64; Square::COUNT]; 8] = {
    let mut rays = [[0; Square::COUNT]; 8];

    let mut dir = 0;
    while dir < RAY_DELTAS.len() {
        let (df, dr) = RAY_DELTAS[dir];
        let mut i = 0;
        while i < Square::COUNT {
            let mut to = Square::from_index_unchecked(i);
            while let Some(shifted) = to.offset(df, dr) {
                rays[dir][i] |= 1 << shifted.0;
                to = shifted;
            }
            i += 1;
        }
        dir += 1;
    }

    rays
};

/// Squares strictly between two squares that share a line, indexed by `[from][to]`.
///
/// Empty if the squares are not aligned.
static RAY_BETWEEN: [[u64; Square::COUNT]; Square::COUNT] = {
    let mut between = [[0; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        let mut dir = 0;
        while dir < RAY_DELTAS.len() {
            let (df, dr) = RAY_DELTAS[dir];
            let mut path = 0;
            let mut to = from;
            while let Some(shifted) = to.offset(df, dr) {
                between[i][shifted.0 as usize] = path;
                path |= 1 << shifted.0;
                to = shifted;
            }
            dir += 1;
        }
        i += 1;
    }

    between
};

/// The full line (edge to edge) through two aligned squares, indexed by `[from][to]`.
///
/// Empty if the squares are not aligned, or identical.
static RAY_CONTAINING: [[u64; Square::COUNT]; Square::COUNT] = {
    let mut lines = [[0; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let mut dir = 0;
        // Each pair of opposite directions sits four apart in `RAY_DELTAS`
        while dir < 4 {
            let line = UNBLOCKED_RAYS[dir][i] | UNBLOCKED_RAYS[dir + 4][i] | (1 << i);
            let mut squares = line ^ (1 << i);
            while squares != 0 {
                let j = squares.trailing_zeros() as usize;
                lines[i][j] = line;
                squares &= squares - 1;
            }
            dir += 1;
        }
        i += 1;
    }

    lines
};

static KNIGHT_ATTACKS: [u64; Square::COUNT] = generate_leaper_attacks(&KNIGHT_DELTAS);
static KING_ATTACKS: [u64; Square::COUNT] = generate_leaper_attacks(&KING_DELTAS);
static PAWN_ATTACKS: [[u64; Square::COUNT]; Color::COUNT] = [
    generate_leaper_attacks(&[(1, 1), (-1, 1)]),
    generate_leaper_attacks(&[(1, -1), (-1, -1)]),
];

/// Builds the attack table of a piece that jumps by a fixed set of deltas.
///
/// Deltas that leave the board are dropped, so nothing wraps from one edge to the other.
const fn generate_leaper_attacks(deltas: &[(i8, i8)]) -> [u64; Square::COUNT] {
    let mut attacks = [0; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square::from_index_unchecked(i);
        let mut j = 0;
        while j < deltas.len() {
            let (df, dr) = deltas[j];
            if let Some(to) = square.offset(df, dr) {
                attacks[i] |= 1 << to.0;
            }
            j += 1;
        }
        i += 1;
    }

    attacks
}

/// Attacks along one direction, stopping at (and including) the first blocker.
#[inline(always)]
fn slide(dir: usize, square: Square, blockers: Bitboard) -> u64 {
    let ray = RAYS[dir][square.index()];
    let hits = ray & blockers.0;

    if hits == 0 {
        return ray;
    }

    let nearest = if dir < 4 {
        hits.trailing_zeros()
    } else {
        63 - hits.leading_zeros()
    };

    ray ^ RAYS[dir][nearest as usize]
}

/// Squares a Rook on `square` attacks, given the occupancy `blockers`.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let blockers = Bitboard::from_square(Square::E6) | Square::C4;
/// let attacks = rook_attacks(Square::E4, blockers);
/// assert!(attacks.intersects(Square::E6));
/// assert!(!attacks.intersects(Square::E7));
/// assert!(attacks.intersects(Square::C4));
/// assert!(!attacks.intersects(Square::B4));
/// assert!(attacks.intersects(Square::H4));
/// ```
#[inline(always)]
pub fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    Bitboard(
        slide(NORTH, square, blockers)
            | slide(EAST, square, blockers)
            | slide(SOUTH, square, blockers)
            | slide(WEST, square, blockers),
    )
}

/// Squares a Bishop on `square` attacks, given the occupancy `blockers`.
#[inline(always)]
pub fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    Bitboard(
        slide(NORTHEAST, square, blockers)
            | slide(NORTHWEST, square, blockers)
            | slide(SOUTHEAST, square, blockers)
            | slide(SOUTHWEST, square, blockers),
    )
}

#[inline(always)]
pub fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers) | bishop_attacks(square, blockers)
}

#[inline(always)]
pub fn knight_attacks(square: Square) -> Bitboard {
    Bitboard(KNIGHT_ATTACKS[square.index()])
}

#[inline(always)]
pub fn king_attacks(square: Square) -> Bitboard {
    Bitboard(KING_ATTACKS[square.index()])
}

/// Squares a Pawn of `color` on `square` attacks diagonally.
#[inline(always)]
pub fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    Bitboard(PAWN_ATTACKS[color.index()][square.index()])
}

/// Squares strictly between `from` and `to`, or an empty board if they do not share a line.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let between = ray_between(Square::A1, Square::D4);
/// assert_eq!(between, Bitboard::from_square(Square::B2) | Square::C3);
/// assert!(ray_between(Square::A1, Square::B3).is_empty());
/// ```
#[inline(always)]
pub fn ray_between(from: Square, to: Square) -> Bitboard {
    Bitboard(RAY_BETWEEN[from.index()][to.index()])
}

/// The entire line through `from` and `to`, or an empty board if they do not share a line.
#[inline(always)]
pub fn ray_containing(from: Square, to: Square) -> Bitboard {
    Bitboard(RAY_CONTAINING[from.index()][to.index()])
}

/// Squares attacked by `piece` on `square`, given the occupancy `blockers`.
///
/// For Pawns this is only their diagonal captures, never their pushes.
#[inline(always)]
pub fn attacks_for(piece: Piece, square: Square, blockers: Bitboard) -> Bitboard {
    match piece.kind() {
        PieceKind::Pawn => pawn_attacks(square, piece.color()),
        PieceKind::Knight => knight_attacks(square),
        PieceKind::Bishop => bishop_attacks(square, blockers),
        PieceKind::Rook => rook_attacks(square, blockers),
        PieceKind::Queen => queen_attacks(square, blockers),
        PieceKind::King => king_attacks(square),
    }
}
