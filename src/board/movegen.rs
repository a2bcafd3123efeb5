/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    attackers_to, attacks_for, checkers, king_attacks, pawn_attacks, pinned, ray_between,
    ray_containing, Bitboard, Color, Move, MoveKind, MoveList, Piece, PieceKind, Position,
    Rank, Square,
};

/// Generates every pseudo-legal move for the side to move, including castling.
///
/// Pseudo-legal moves obey piece movement and blocking rules, but may leave the mover's King in check.
/// No particular order is imposed.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let pos = Position::default();
/// assert_eq!(generate_pseudo_legal(&pos).len(), 20);
/// ```
pub fn generate_pseudo_legal(position: &Position) -> MoveList {
    let own = position.color(position.side_to_move());

    let mut moves = MoveList::new();
    generate_moves(position, !own, !own, true, &mut moves);
    moves
}

/// Generates every legal move for the side to move.
///
/// If the side to move is in check, this defers to [`generate_check_evasions`].
///
/// # Example
/// ```
/// # use tadpole::*;
/// let mut pos: Position = FEN_KIWIPETE.parse().unwrap();
/// assert_eq!(generate_legal(&mut pos).len(), 48);
/// ```
pub fn generate_legal(position: &mut Position) -> MoveList {
    if checkers(position).is_nonempty() {
        return generate_check_evasions(position);
    }

    let mut moves = generate_pseudo_legal(position);
    retain_legal(position, &mut moves, true);
    moves
}

/// Generates the legal moves that capture an enemy piece, en passant included.
///
/// Quiet promotions are excluded; capturing promotions are kept.
pub fn generate_captures(position: &mut Position) -> MoveList {
    let color = position.side_to_move();
    let enemies = position.color(color.opponent());
    let in_check = checkers(position).is_nonempty();

    let mut moves = MoveList::new();
    generate_moves(position, enemies, enemies, false, &mut moves);
    retain_legal(position, &mut moves, !in_check);
    moves
}

/// Generates the legal replies to a check.
///
/// Against a single checker, non-King pieces may only capture it or block its ray (en passant included).
/// Against two checkers, only King moves are generated.
/// If the side to move is not in check, every legal move is returned.
///
/// # Example
/// ```
/// # use tadpole::*;
/// // Double check from a Knight and a Rook
/// let mut pos: Position = "4k3/8/5N2/8/8/8/8/4R1K1 b - - 0 1".parse().unwrap();
/// let evasions = generate_check_evasions(&mut pos);
/// assert!(evasions.iter().all(|mv| mv.from() == Square::E8));
/// ```
pub fn generate_check_evasions(position: &mut Position) -> MoveList {
    let color = position.side_to_move();
    let checkers = checkers(position);
    if checkers.is_empty() {
        return generate_legal(position);
    }

    let king = position.king_square(color);
    let own = position.color(color);

    let targets = match checkers.to_square() {
        Some(checker) => checkers | ray_between(king, checker),
        None => Bitboard::EMPTY_BOARD,
    };

    let mut moves = MoveList::new();
    generate_moves(position, targets, !own, false, &mut moves);

    // Every non-King move already resolves the check, unless it was pinned or en passant
    retain_legal(position, &mut moves, true);
    moves
}

/// Returns `true` if `mv` is legal in `position`.
pub fn is_legal(position: &mut Position, mv: Move) -> bool {
    generate_legal(position).contains(&mv)
}

/// Removes every move that leaves the mover's King attacked.
///
/// When `trust_unpinned` is set, non-King moves (other than en passant) are decided without being played:
/// unpinned pieces are kept, and pinned pieces are kept only while they stay on the line through their King.
/// That shortcut is only sound when the destinations were already restricted to resolve any check.
fn retain_legal(position: &mut Position, moves: &mut MoveList, trust_unpinned: bool) {
    let color = position.side_to_move();
    let king = position.king_square(color);
    let pinned = pinned(position, color);

    moves.retain(|mv| {
        let mv = *mv;
        if trust_unpinned && mv.from() != king && !mv.is_en_passant() {
            return !pinned.intersects(mv.from())
                || ray_containing(king, mv.from()).intersects(mv.to());
        }

        position.make_move(mv);
        let legal = !position.is_in_check(color);
        position.unmake_move();
        legal
    });
}

/// Appends pseudo-legal moves of the side to move.
///
/// Non-King pieces may only land on `targets`, and the King only on `king_targets`.
fn generate_moves(
    position: &Position,
    targets: Bitboard,
    king_targets: Bitboard,
    castling: bool,
    moves: &mut MoveList,
) {
    let color = position.side_to_move();
    let blockers = position.occupied();

    generate_pawn_moves(position, targets, moves);

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        let piece = Piece::new(color, kind);
        for from in position.piece(piece) {
            let attacks = attacks_for(piece, from, blockers);
            serialize_normal_moves(position, from, attacks & targets, moves);
        }
    }

    let king = position.king_square(color);
    serialize_normal_moves(position, king, king_attacks(king) & king_targets, moves);

    if castling {
        generate_castling_moves(position, moves);
    }
}

/// Creates and appends a [`Move`] that is either a quiet or capture, for every square in `destinations`.
#[inline(always)]
fn serialize_normal_moves(
    position: &Position,
    from: Square,
    destinations: Bitboard,
    moves: &mut MoveList,
) {
    let enemies = position.color(position.side_to_move().opponent());
    for to in destinations {
        let kind = if enemies.intersects(to) {
            MoveKind::Capture
        } else {
            MoveKind::Quiet
        };
        moves.push(Move::new(from, to, kind));
    }
}

/// Appends one move per promotion piece, Queen first.
#[inline(always)]
fn serialize_promotions(from: Square, to: Square, is_capture: bool, moves: &mut MoveList) {
    for promotion in PieceKind::promotions() {
        moves.push(Move::new(
            from,
            to,
            MoveKind::promotion(promotion, is_capture),
        ));
    }
}

/// Generates and serializes Pawn pushes, captures, promotions, and en passant.
fn generate_pawn_moves(position: &Position, targets: Bitboard, moves: &mut MoveList) {
    let color = position.side_to_move();
    let empty = position.empty();
    let enemies = position.color(color.opponent());
    let last_rank = Rank::eighth(color);

    for from in position.pawns(color) {
        // Pushes
        if let Some(single) = from.forward_by(color, 1).filter(|to| empty.intersects(*to)) {
            if targets.intersects(single) {
                if single.rank() == last_rank {
                    serialize_promotions(from, single, false, moves);
                } else {
                    moves.push(Move::new(from, single, MoveKind::Quiet));
                }
            }

            if let Some(double) = single
                .forward_by(color, 1)
                .filter(|to| Bitboard::double_push_rank(color).intersects(*to))
                .filter(|to| empty.intersects(*to) && targets.intersects(*to))
            {
                moves.push(Move::new(from, double, MoveKind::PawnDoublePush));
            }
        }

        // Captures
        let attacks = pawn_attacks(from, color);
        for to in attacks & enemies & targets {
            if to.rank() == last_rank {
                serialize_promotions(from, to, true, moves);
            } else {
                moves.push(Move::new(from, to, MoveKind::Capture));
            }
        }

        // En passant is allowed if it lands on a target or removes a targeted Pawn
        if let Some(ep) = position.ep_square().filter(|ep| attacks.intersects(*ep)) {
            let victim = Square::new(ep.file(), from.rank());
            if targets.intersects(ep) || targets.intersects(victim) {
                moves.push(Move::new(from, ep, MoveKind::EnPassantCapture));
            }
        }
    }
}

/// Generates castling moves as "King takes own Rook".
///
/// Requires the right to still be held, every square the King and Rook travel over to be empty (ignoring the two of them),
/// and no square the King starts on or passes through to be attacked.
/// The King's landing square is left to the legality check.
fn generate_castling_moves(position: &Position, moves: &mut MoveList) {
    let color = position.side_to_move();
    let king = position.king_square(color);

    for short in [true, false] {
        let Some(rook) = position.castling_rook(color, short) else {
            continue;
        };

        let kind = if short {
            MoveKind::ShortCastle
        } else {
            MoveKind::LongCastle
        };
        let mv = Move::new(king, rook, kind);
        let Some((king_to, rook_to)) = mv.castling_destinations() else {
            continue;
        };

        let occupied = position.occupied() ^ king ^ rook;
        let travel = ray_between(king, king_to) | king_to | ray_between(rook, rook_to) | rook_to;
        if occupied.intersects(travel) {
            continue;
        }

        let king_path = ray_between(king, king_to) | king;
        if king_path
            .iter()
            .any(|square| is_attacked_with(position, square, color.opponent(), occupied))
        {
            continue;
        }

        moves.push(mv);
    }
}

#[inline(always)]
fn is_attacked_with(position: &Position, square: Square, by: Color, occupied: Bitboard) -> bool {
    attackers_to(position.board(), square, by, occupied).is_nonempty()
}
