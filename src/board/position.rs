/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref, str::FromStr};

use anyhow::{anyhow, bail, Result};

use crate::{IllegalMoveError, InvariantViolation};

use super::{
    generate_legal, is_attacked, pawn_attacks, Bitboard, Color, File, Move, Piece, PieceKind,
    Rank, Square, ZobristKey, FEN_STARTPOS,
};

/// A 4-bit set of castling rights: King-side and Queen-side, for each player.
///
/// Which Rook each right refers to is tracked separately by the [`Position`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_SHORT: Self = Self(0b0001);
    pub const WHITE_LONG: Self = Self(0b0010);
    pub const BLACK_SHORT: Self = Self(0b0100);
    pub const BLACK_LONG: Self = Self(0b1000);

    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    /// Number of possible combinations of castling rights.
    pub const COUNT: usize = 16;

    /// The right for `color` to castle King-side (`short`) or Queen-side.
    #[inline(always)]
    pub const fn side(color: Color, short: bool) -> Self {
        Self(1 << (color.index() * 2 + !short as usize))
    }

    /// Both rights of `color`.
    #[inline(always)]
    pub const fn both(color: Color) -> Self {
        Self(0b11 << (color.index() * 2))
    }

    #[inline(always)]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[inline(always)]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline(always)]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline(always)]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Creates a `usize` for indexing into lists of [`CastlingRights::COUNT`] elements.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CastlingRights {
    /// Standard `KQkq` notation, or `-` if empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }

        for (right, c) in [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ] {
            if self.contains(right) {
                write!(f, "{c}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:04b})", self.0)
    }
}

/// Everything needed to reverse a single move in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Undo {
    pub(crate) mv: Move,
    /// The piece that moved; `None` for the null move.
    moved: Option<Piece>,
    captured: Option<Piece>,
    castling: CastlingRights,
    ep_square: Option<Square>,
    halfmove: usize,
    pub(crate) key: ZobristKey,
}

/// The full, mutable state of a game: piece placement, side to move, castling rights,
/// en passant square, move counters, an incremental [`ZobristKey`], and a stack of [`Undo`] records.
///
/// A [`Position`] is meant to be mutated in place with [`Position::make_move`] and [`Position::unmake_move`].
/// Cloning copies the entire undo stack, so it is reserved for states that must outlive a search.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// Bitboard representation of the game board.
    board: Board,

    /// The [`Color`] of the current player.
    side_to_move: Color,

    /// Castling rights for each player.
    castling: CastlingRights,

    /// Original squares of the castling Rooks, indexed by `[color][short, long]`.
    castling_rooks: [[Option<Square>; 2]; Color::COUNT],

    /// Square directly behind a Pawn that just moved two squares.
    ///
    /// Only set if an enemy Pawn could (pseudo-legally) capture onto it.
    ep_square: Option<Square>,

    /// Used to enforce the fifty-move rule.
    ///
    /// - Incremented after each move.
    /// - Reset after a capture or a pawn moves.
    halfmove: usize,

    /// Number of moves since the beginning of the game.
    ///
    /// A fullmove is a complete turn by white and then by black.
    fullmove: usize,

    /// Zobrist hash key of this position
    key: ZobristKey,

    /// One record per move made, most recent last.
    history: Vec<Undo>,
}

impl Position {
    /// Creates a new, empty [`Position`] with the following properties:
    /// * No pieces on the board
    /// * White moves first
    /// * No castling rights
    /// * No en passant square available
    /// * Halfmove counter set to 0
    /// * Fullmove counter set to 1
    ///
    /// This is not a playable position, since neither side has a King.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// let pos = Position::new();
    /// assert_eq!(pos.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    /// ```
    pub fn new() -> Self {
        let board = Board::new();
        let key = ZobristKey::from_parts(&board, None, CastlingRights::NONE, Color::White);

        Self {
            board,
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            castling_rooks: [[None; 2]; Color::COUNT],
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            key,
            history: Vec::with_capacity(256),
        }
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Castling rights may be given as `KQkq` or in Shredder/X-FEN form (Rook files, like `HAha`).
    /// An en passant square is only kept if a Pawn of the side to move could capture onto it.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(pos.to_fen(), FEN_KIWIPETE);
    ///
    /// assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::new();
        let mut split = fen.split_whitespace();

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements."))?;
        pos.board = Board::from_fen(placements)?;

        pos.side_to_move = match split.next().unwrap_or("w") {
            "w" => Color::White,
            "b" => Color::Black,
            other => bail!("FEN side to move must be `w` or `b`. Got {other:?}"),
        };

        // King counts are needed before castling rights can be attributed to a side
        pos.validate_kings()?;

        let castling = split.next().unwrap_or("-");
        if castling != "-" {
            for c in castling.chars() {
                pos.parse_castling_char(c)?;
            }
        }

        let en_passant_target = split.next().unwrap_or("-");
        pos.ep_square = match en_passant_target {
            "-" => None,
            square => {
                let square = Square::from_uci(square)?;
                let expected = match pos.side_to_move {
                    Color::White => Rank::SIX,
                    Color::Black => Rank::THREE,
                };
                if square.rank() != expected {
                    bail!("FEN en passant square {square} is on the wrong rank");
                }
                pos.filter_ep_square(square, pos.side_to_move)
            }
        };

        let halfmove = split.next().unwrap_or("0");
        pos.halfmove = halfmove.parse().or(Err(anyhow!(
            "FEN string must have valid halfmove counter. Got {halfmove:?}"
        )))?;

        let fullmove = split.next().unwrap_or("1");
        pos.fullmove = fullmove.parse().or(Err(anyhow!(
            "FEN string must have valid fullmove counter. Got {fullmove:?}"
        )))?;

        pos.key = pos.recompute_key();

        Ok(pos)
    }

    /// Assigns a single castling right from its FEN character.
    fn parse_castling_char(&mut self, c: char) -> Result<()> {
        let color = Color::from_bool(c.is_ascii_uppercase());
        let back_rank = Rank::first(color);
        let king = self
            .board
            .find_king(color)
            .ok_or(anyhow!("{color} cannot castle without a King"))?;

        if king.rank() != back_rank {
            bail!("{color} cannot castle with a King on {king}");
        }

        let rooks = self.board.rooks(color) & Bitboard::from_rank(back_rank);
        let rook = match c.to_ascii_lowercase() {
            // Outermost Rook on either side of the King
            'k' => rooks
                .iter()
                .filter(|sq| sq.file().index() > king.file().index())
                .last(),
            'q' => rooks
                .iter()
                .find(|sq| sq.file().index() < king.file().index()),
            file => {
                let square = Square::new(File::from_char(file)?, back_rank);
                rooks.intersects(square).then_some(square)
            }
        }
        .ok_or(anyhow!("Castling right {c:?} has no matching Rook"))?;

        let short = rook.file().index() > king.file().index();
        self.castling_rooks[color][!short as usize] = Some(rook);
        self.castling.insert(CastlingRights::side(color, short));

        Ok(())
    }

    /// Returns `Some(square)` only if a Pawn of `capturer` could capture onto `square` en passant.
    fn filter_ep_square(&self, square: Square, capturer: Color) -> Option<Square> {
        let attackers = pawn_attacks(square, capturer.opponent()) & self.board.pawns(capturer);
        attackers.is_nonempty().then_some(square)
    }

    /// Generates a FEN string from this [`Position`].
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let pos = Position::default();
    /// assert_eq!(pos.to_fen(), FEN_STARTPOS);
    /// ```
    #[inline(always)]
    pub fn to_fen(&self) -> String {
        format!("{self}")
    }

    /// Generates a FEN string from this [`Position`] with castling rights in Shredder (Rook file) format.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// let pos = Position::default();
    /// assert_eq!(pos.to_960_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1");
    /// ```
    pub fn to_960_fen(&self) -> String {
        format!("{self:#}")
    }

    /// Returns the current player as a [`Color`].
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// If en passant can be performed, returns the en passant [`Square`].
    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// The Rook `color` would castle with on the given side, if that right is still held.
    #[inline(always)]
    pub const fn castling_rook(&self, color: Color, short: bool) -> Option<Square> {
        if self.castling.contains(CastlingRights::side(color, short)) {
            self.castling_rooks[color.index()][!short as usize]
        } else {
            None
        }
    }

    /// Castling rights in Shredder notation: the file of each castling Rook.
    pub fn castling_rights_960(&self) -> String {
        let mut castling = String::with_capacity(4);

        for color in Color::all() {
            for short in [true, false] {
                if let Some(rook) = self.castling_rook(color, short) {
                    let c = rook.file().char();
                    castling.push(if color.is_white() {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    });
                }
            }
        }

        if castling.is_empty() {
            castling.push('-');
        }
        castling
    }

    /// Returns the half-move counter of the current position.
    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    /// Returns the full-move counter of the current position.
    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    /// Fetch the Zobrist hash key of this position.
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Fetches this position's [`Board`]
    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Number of moves made on this position since it was created.
    #[inline(always)]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Square of `color`'s King.
    ///
    /// # Panics
    ///
    /// If `color` has no King. [`Position::from_fen`] never builds such a position.
    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Square {
        match self.board.find_king(color) {
            Some(square) => square,
            None => panic!("{}", InvariantViolation::MissingKing(color)),
        }
    }

    /// Returns `true` if `square` is attacked by any piece of `by`.
    #[inline(always)]
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        is_attacked(self, square, by)
    }

    /// Returns `true` if `color`'s King is attacked.
    #[inline(always)]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), color.opponent())
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.is_in_check(self.side_to_move)
    }

    /// Returns `true` if the half-move counter is 100 or greater.
    ///
    /// Since "half-move" increases with ply, the 50-move rule takes effect at 100 ply.
    #[inline(always)]
    pub const fn can_draw_by_fifty(&self) -> bool {
        self.halfmove >= 100
    }

    /// Number of earlier occurrences of the current position, according to the move history.
    ///
    /// Only positions since the last irreversible move, with the same side to move, are considered.
    pub fn repetitions(&self) -> usize {
        let window = self.halfmove.min(self.history.len());

        self.history
            .iter()
            .rev()
            .take(window)
            .skip(1)
            .step_by(2)
            .filter(|undo| undo.key == self.key)
            .count()
    }

    /// Returns `true` if the current position has occurred at least `count` times, including now.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let mut pos = Position::default();
    /// for _ in 0..2 {
    ///     for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
    ///         let mv = parse_coordinate(&mut pos, mv).unwrap();
    ///         pos.make_move(mv);
    ///     }
    /// }
    /// assert!(pos.is_repetition(3));
    /// assert!(!pos.is_repetition(4));
    /// ```
    #[inline(always)]
    pub fn is_repetition(&self, count: usize) -> bool {
        self.repetitions() + 1 >= count
    }

    /// Returns `true` if there is insufficient material on the board to cause a checkmate.
    ///
    /// Covers lone Kings, a single minor piece, and one Bishop each on same-colored squares.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let kbk: Position = "8/4k3/8/8/3K4/8/5B2/8 w - - 0 1".parse().unwrap();
    /// assert!(kbk.has_insufficient_material());
    ///
    /// let same_square_bishops: Position = "8/2b1k3/8/8/3K4/8/5B2/8 w - - 0 1".parse().unwrap();
    /// assert!(same_square_bishops.has_insufficient_material());
    ///
    /// let diff_square_bishops: Position = "8/3bk3/8/8/3K4/8/5B2/8 w - - 0 1".parse().unwrap();
    /// assert!(!diff_square_bishops.has_insufficient_material());
    /// ```
    pub fn has_insufficient_material(&self) -> bool {
        let heavy = self.board.kind(PieceKind::Queen)
            | self.board.kind(PieceKind::Rook)
            | self.board.kind(PieceKind::Pawn);
        if heavy.is_nonempty() {
            return false;
        }

        let wb = self.board.bishops(Color::White);
        let wn = self.board.knights(Color::White);
        let bb = self.board.bishops(Color::Black);
        let bn = self.board.knights(Color::Black);

        match (
            wb.population(),
            wn.population(),
            bb.population(),
            bn.population(),
        ) {
            (0, 0, 0, 0) | (1, 0, 0, 0) | (0, 0, 1, 0) | (0, 1, 0, 0) | (0, 0, 0, 1) => true,

            (1, 0, 1, 0) => match (wb.lsb(), bb.lsb()) {
                (Some(w), Some(b)) => w.is_light() == b.is_light(),
                _ => false,
            },

            _ => false,
        }
    }

    /// Applies `mv` without any check for legality.
    ///
    /// Castling moves are given as "King takes own Rook", and en passant removes the Pawn behind the destination.
    ///
    /// # Panics
    ///
    /// If there is no piece on the source square of a non-null move.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let mut pos = Position::default();
    /// let original = pos.clone();
    ///
    /// pos.make_move(Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush));
    /// assert_eq!(pos.side_to_move(), Color::Black);
    ///
    /// pos.unmake_move();
    /// assert_eq!(pos, original);
    /// ```
    pub fn make_move(&mut self, mv: Move) {
        let color = self.side_to_move;
        let from = mv.from();
        let to = mv.to();

        let mut undo = Undo {
            mv,
            moved: None,
            captured: None,
            castling: self.castling,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
        };

        // The en passant square only lives for one ply
        self.key.hash_ep_square(self.ep_square.take());

        self.halfmove += 1;
        self.fullmove += color.index();

        if !mv.is_null() {
            let Some(piece) = self.board.piece_at(from) else {
                panic!("Cannot make move {mv:?}: no piece on {from} in {self}");
            };
            undo.moved = Some(piece);

            if let Some((king_to, rook_to)) = mv.castling_destinations() {
                let rook = Piece::new(color, PieceKind::Rook);
                self.remove(from, piece);
                self.remove(to, rook);
                self.put(king_to, piece);
                self.put(rook_to, rook);
            } else {
                if mv.is_capture() {
                    let victim_square = if mv.is_en_passant() {
                        Square::new(to.file(), from.rank())
                    } else {
                        to
                    };

                    if let Some(victim) = self.board.piece_at(victim_square) {
                        self.remove(victim_square, victim);
                        undo.captured = Some(victim);
                    }
                    self.halfmove = 0;
                }

                self.remove(from, piece);
                let placed = match mv.promotion() {
                    Some(promotion) => piece.promoted(promotion),
                    None => piece,
                };
                self.put(to, placed);

                if piece.kind() == PieceKind::Pawn {
                    self.halfmove = 0;

                    if mv.is_pawn_double_push() {
                        self.ep_square = from
                            .forward_by(color, 1)
                            .and_then(|ep| self.filter_ep_square(ep, color.opponent()));
                        self.key.hash_ep_square(self.ep_square);
                    }
                }
            }

            self.update_castling_rights(from, to, piece);
        }

        self.side_to_move = color.opponent();
        self.key.hash_side_to_move();
        self.history.push(undo);
    }

    /// Passes the turn. Equivalent to [`Position::make_move`] with [`Move::null`].
    #[inline(always)]
    pub fn make_null_move(&mut self) {
        self.make_move(Move::null());
    }

    /// Removes any castling rights invalidated by a piece moving from `from` to `to`.
    fn update_castling_rights(&mut self, from: Square, to: Square, piece: Piece) {
        let old = self.castling;

        if piece.kind() == PieceKind::King {
            self.castling.remove(CastlingRights::both(piece.color()));
        }

        // A Rook leaving its square, or being captured on it
        for color in Color::all() {
            for short in [true, false] {
                if let Some(rook) = self.castling_rook(color, short) {
                    if rook == from || rook == to {
                        self.castling.remove(CastlingRights::side(color, short));
                    }
                }
            }
        }

        if old != self.castling {
            self.key.hash_castling_rights(old);
            self.key.hash_castling_rights(self.castling);
        }
    }

    /// Reverts the most recent move, returning it.
    ///
    /// # Panics
    ///
    /// If no moves have been made. Use [`Position::try_unmake_move`] to get an error instead.
    pub fn unmake_move(&mut self) -> Move {
        match self.try_unmake_move() {
            Ok(mv) => mv,
            Err(err) => panic!("{err}"),
        }
    }

    /// Reverts the most recent move, or returns [`InvariantViolation::EmptyHistory`] if there is none.
    pub fn try_unmake_move(&mut self) -> Result<Move, InvariantViolation> {
        let undo = self
            .history
            .pop()
            .ok_or(InvariantViolation::EmptyHistory)?;
        let mv = undo.mv;

        let color = self.side_to_move.opponent();
        self.side_to_move = color;
        self.fullmove -= color.index();

        if let Some(piece) = undo.moved {
            let from = mv.from();
            let to = mv.to();

            if let Some((king_to, rook_to)) = mv.castling_destinations() {
                self.board.take(king_to);
                self.board.take(rook_to);
                self.board.place(piece, from);
                self.board.place(Piece::new(color, PieceKind::Rook), to);
            } else {
                self.board.take(to);
                self.board.place(piece, from);

                if let Some(captured) = undo.captured {
                    let victim_square = if mv.is_en_passant() {
                        Square::new(to.file(), from.rank())
                    } else {
                        to
                    };
                    self.board.place(captured, victim_square);
                }
            }
        }

        self.castling = undo.castling;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.key = undo.key;

        Ok(mv)
    }

    /// Applies `mv` only if it is legal in this position.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let mut pos = Position::default();
    /// assert!(pos.play(Move::new(Square::E2, Square::E5, MoveKind::Quiet)).is_err());
    /// assert!(pos.play(Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush)).is_ok());
    /// ```
    pub fn play(&mut self, mv: Move) -> Result<(), IllegalMoveError> {
        if !generate_legal(self).contains(&mv) {
            let reason = match self.board.piece_at(mv.from()) {
                None => format!("there is no piece on {}", mv.from()),
                Some(piece) if piece.color() != self.side_to_move => {
                    format!("{} does not belong to {}", piece.kind(), self.side_to_move)
                }
                Some(piece) => format!("{} cannot make this move", piece.kind()),
            };
            return Err(IllegalMoveError::new(mv.to_string(), reason, self));
        }

        self.make_move(mv);
        Ok(())
    }

    /// Checks that exactly one King exists per side and that the incremental hash matches a fresh computation.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        self.validate_kings()?;

        let expected = self.recompute_key();
        if expected != self.key {
            return Err(InvariantViolation::HashMismatch {
                expected,
                found: self.key,
            });
        }

        Ok(())
    }

    fn validate_kings(&self) -> Result<(), InvariantViolation> {
        for color in Color::all() {
            match self.board.king(color).population() {
                0 => return Err(InvariantViolation::MissingKing(color)),
                1 => {}
                count => return Err(InvariantViolation::ExtraKing { color, count }),
            }
        }
        Ok(())
    }

    /// Computes the Zobrist key of this position from scratch.
    #[inline(always)]
    pub fn recompute_key(&self) -> ZobristKey {
        ZobristKey::from_parts(
            &self.board,
            self.ep_square,
            self.castling,
            self.side_to_move,
        )
    }

    /// Places `piece` on `square`, updating the hash.
    #[inline(always)]
    fn put(&mut self, square: Square, piece: Piece) {
        self.board.place(piece, square);
        self.key.hash_piece(square, piece);
    }

    /// Removes `piece` from `square`, updating the hash.
    #[inline(always)]
    fn remove(&mut self, square: Square, piece: Piece) {
        self.board.take(square);
        self.key.hash_piece(square, piece);
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Deref for Position {
    type Target = Board;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.board
    }
}

impl Default for Position {
    /// The standard starting position.
    fn default() -> Self {
        match Self::from_fen(FEN_STARTPOS) {
            Ok(pos) => pos,
            Err(err) => unreachable!("startpos FEN failed to parse: {err}"),
        }
    }
}

impl fmt::Display for Position {
    /// Display this position's FEN string.
    ///
    /// If the alternate format mode (`#`) was specified, this will print the castling rights in Shredder format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let placements = self.board.to_fen();
        let active_color = self.side_to_move.to_uci();

        let castling = if f.alternate() {
            self.castling_rights_960()
        } else {
            self.castling.to_string()
        };

        let en_passant_target = match self.ep_square {
            Some(square) => square.to_string(),
            None => String::from("-"),
        };

        write!(
            f,
            "{placements} {active_color} {castling} {en_passant_target} {} {}",
            self.halfmove, self.fullmove
        )
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let piece_char = self
                    .board
                    .piece_at(Square::new(file, rank))
                    .map(|p| p.char())
                    .unwrap_or('.');
                write!(f, " {piece_char}")?;
            }

            if rank == Rank::SEVEN {
                write!(f, "           FEN: {self}")?;
            } else if rank == Rank::SIX {
                write!(f, "          Side: {}", self.side_to_move)?;
            } else if rank == Rank::FIVE {
                write!(f, "      Castling: {}", self.castling)?;
            } else if rank == Rank::FOUR {
                let ep = self.ep_square.map(|t| t.to_uci()).unwrap_or(String::from("-"));
                write!(f, "            EP: {ep}")?;
            } else if rank == Rank::THREE {
                write!(f, "     Half-move: {}", self.halfmove)?;
            } else if rank == Rank::TWO {
                write!(f, "     Full-move: {}", self.fullmove)?;
            } else if rank == Rank::ONE {
                write!(f, "           Key: {}", self.key)?;
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }

        Ok(())
    }
}

/// Represents all pieces and their locations on a chess board.
///
/// Has no knowledge of castling rights, en passant, or move counters. If you need those, see [`Position`].
///
/// Internally uses a collection of [`Bitboard`]s to keep track of piece/color locations.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    /// All squares occupied by a specific color.
    colors: [Bitboard; Color::COUNT],

    /// All squares occupied by a specific piece kind.
    pieces: [Bitboard; PieceKind::COUNT],

    /// Redundant mailbox to speed up [`Board::piece_at`].
    mailbox: [Option<Piece>; Square::COUNT],
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            pieces: [Bitboard::EMPTY_BOARD; PieceKind::COUNT],
            mailbox: [None; Square::COUNT],
        }
    }

    /// Constructs a [`Board`] from the placements field of a FEN string.
    ///
    /// # Example
    /// ```
    /// # use tadpole::*;
    /// let board = Board::from_fen("8/8/8/3k4/8/8/8/4K3").unwrap();
    /// assert_eq!(board.piece_at(Square::D5), Some(Piece::BLACK_KING));
    ///
    /// assert!(Board::from_fen("8/8/8/9/8/8/8/8").is_err());
    /// ```
    pub fn from_fen(placements: &str) -> Result<Self> {
        let mut board = Self::new();

        if placements.matches('/').count() != 7 {
            bail!("FEN must have piece placements for all 8 ranks");
        }

        // Reversed so that White's pieces end up at the "bottom" of the board
        for (rank, row) in placements.split('/').rev().enumerate() {
            let mut file = 0;

            for piece_char in row.chars() {
                if let Some(empty) = piece_char.to_digit(10) {
                    file += empty as u8;
                } else {
                    let piece = Piece::from_uci(piece_char)?;
                    if file >= File::COUNT as u8 {
                        bail!("FEN rank {} has more than 8 squares", rank + 1);
                    }
                    board.place(piece, Square::new(File(file), Rank(rank as u8)));
                    file += 1;
                }
            }

            if file != File::COUNT as u8 {
                bail!("FEN rank {} must have 8 squares. Got {file}", rank + 1);
            }
        }

        Ok(board)
    }

    /// Places `piece` on `square`. The square should be empty.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        self.colors[piece.color()].set(square);
        self.pieces[piece.kind()].set(square);
        self.mailbox[square] = Some(piece);
    }

    /// Removes and returns whatever piece is on `square`.
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.mailbox[square].take()?;
        self.colors[piece.color()].clear(square);
        self.pieces[piece.kind()].clear(square);
        Some(piece)
    }

    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    #[inline(always)]
    pub fn kind_at(&self, square: Square) -> Option<PieceKind> {
        self.piece_at(square).map(|piece| piece.kind())
    }

    /// All squares occupied by pieces of `kind`, of either color.
    #[inline(always)]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// All squares occupied by `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        Bitboard(self.colors[0].0 | self.colors[1].0)
    }

    #[inline(always)]
    pub const fn empty(&self) -> Bitboard {
        Bitboard(!self.occupied().0)
    }

    #[inline(always)]
    pub const fn piece(&self, piece: Piece) -> Bitboard {
        self.piece_parts(piece.color(), piece.kind())
    }

    #[inline(always)]
    pub const fn piece_parts(&self, color: Color, kind: PieceKind) -> Bitboard {
        Bitboard(self.colors[color.index()].0 & self.pieces[kind.index()].0)
    }

    #[inline(always)]
    pub const fn pawns(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Pawn)
    }

    #[inline(always)]
    pub const fn knights(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Knight)
    }

    #[inline(always)]
    pub const fn bishops(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Bishop)
    }

    #[inline(always)]
    pub const fn rooks(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Rook)
    }

    #[inline(always)]
    pub const fn queens(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Queen)
    }

    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::King)
    }

    /// Square of `color`'s King, if it has one.
    #[inline(always)]
    pub const fn find_king(&self, color: Color) -> Option<Square> {
        self.king(color).lsb()
    }

    /// Rooks and Queens of `color`.
    #[inline(always)]
    pub fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.rooks(color) | self.queens(color)
    }

    /// Bishops and Queens of `color`.
    #[inline(always)]
    pub fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.bishops(color) | self.queens(color)
    }

    /// Iterate over all occupied squares and their pieces.
    #[inline(always)]
    pub const fn iter(&self) -> BoardIter<'_> {
        self.iter_for(self.occupied())
    }

    /// Iterate over the occupied squares of `mask` and their pieces.
    #[inline(always)]
    pub const fn iter_for(&self, mask: Bitboard) -> BoardIter<'_> {
        BoardIter {
            board: self,
            occupancy: Bitboard(mask.0 & self.occupied().0),
        }
    }

    /// The placements field of a FEN string.
    pub fn to_fen(&self) -> String {
        let mut placements = String::with_capacity(72);

        for rank in Rank::iter().rev() {
            let mut empty_spaces = 0;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty_spaces != 0 {
                            placements += &empty_spaces.to_string();
                            empty_spaces = 0;
                        }
                        placements.push(piece.char());
                    }
                    None => empty_spaces += 1,
                }
            }

            if empty_spaces != 0 {
                placements += &empty_spaces.to_string();
            }
            if rank != Rank::ONE {
                placements.push('/');
            }
        }

        placements
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => write!(f, "{piece} ")?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

/// An iterator over a set of squares on a [`Board`].
///
/// Calls to [`Iterator::next`] will yield a tuple of a [`Square`] and a [`Piece`].
pub struct BoardIter<'a> {
    board: &'a Board,
    occupancy: Bitboard,
}

impl Iterator for BoardIter<'_> {
    type Item = (Square, Piece);

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let square = self.occupancy.pop_lsb()?;
        let piece = self.board.piece_at(square)?;
        Some((square, piece))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.occupancy.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BoardIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_coordinate, FEN_KIWIPETE};

    fn play_uci(pos: &mut Position, moves: &[&str]) {
        for mv in moves {
            let mv = parse_coordinate(pos, mv).unwrap();
            pos.make_move(mv);
        }
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "8/8/8/8/8/4k3/8/4K3 b - - 57 120",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn test_uncapturable_ep_square_is_dropped() {
        let pos = Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        )
        .unwrap();
        assert_eq!(pos.ep_square(), None);
        assert_eq!(
            pos.key(),
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .unwrap()
                .key()
        );
    }

    #[test]
    fn test_bad_fens() {
        for fen in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBN1 w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
        ] {
            assert!(Position::from_fen(fen).is_err(), "{fen:?} should not parse");
        }
    }

    #[test]
    fn test_shredder_castling() {
        let fen = "bqnbrkrn/pppppppp/8/8/8/8/PPPPPPPP/BQNBRKRN w GEge - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.castling_rook(Color::White, true), Some(Square::G1));
        assert_eq!(pos.castling_rook(Color::White, false), Some(Square::E1));
        assert_eq!(pos.castling_rook(Color::Black, true), Some(Square::G8));
        assert_eq!(pos.castling_rights(), CastlingRights::ALL);
        assert_eq!(pos.to_fen(), fen.replace("GEge", "KQkq"));
        assert_eq!(pos.to_960_fen(), fen);
    }

    #[test]
    fn test_zobrist_key_components() {
        let fen = "r3k2r/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/R3K2R b KQkq d3 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.ep_square(), Some(Square::D3));

        for other in [
            "r3k2r/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/R3K2R b KQkq - 0 1",
            "r3k2r/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/R3K2R b KQq d3 0 1",
            "r3k2r/pppp1ppp/8/8/3Pp3/8/PPP1PPPP/R3K2R w KQkq - 0 1",
        ] {
            assert_ne!(pos.key(), Position::from_fen(other).unwrap().key());
        }
    }

    #[test]
    fn test_zobrist_key_updates_on_quiet_moves() {
        let mut pos = Position::default();
        let original_key = pos.key();
        assert_ne!(original_key.inner(), 0);

        for mv in ["b1a3", "b8a6", "a3b1"] {
            play_uci(&mut pos, &[mv]);
            assert_ne!(pos.key(), original_key);
            assert_eq!(pos.key(), pos.recompute_key());
        }

        // After returning to the original placement, the keys should be equal again
        play_uci(&mut pos, &["a6b8"]);
        assert_eq!(pos.key(), original_key);
        assert!(pos.is_repetition(2));
    }

    #[test]
    fn test_unmake_restores_everything() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let original = pos.clone();

        // Castle, capture, and a double push that allows en passant
        play_uci(&mut pos, &["e1g1", "h3g2", "d5e6", "c7c5"]);
        assert_eq!(pos.castling_rights().to_string(), "kq");
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.key(), pos.recompute_key());

        for _ in 0..4 {
            pos.unmake_move();
            assert_eq!(pos.key(), pos.recompute_key());
        }
        assert_eq!(pos, original);
        assert_eq!(pos.try_unmake_move(), Err(InvariantViolation::EmptyHistory));
    }

    #[test]
    #[should_panic]
    fn test_unmake_on_empty_history_panics() {
        Position::default().unmake_move();
    }

    // Castling rights are lost when: the King moves, a Rook moves, a Rook is captured, or castling happens.

    #[test]
    fn test_castling_rights_update_on_king_move() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        play_uci(&mut pos, &["e1d1"]);
        assert_eq!(pos.castling_rights().to_string(), "kq");

        play_uci(&mut pos, &["e8f8", "d1e1", "f8e8"]);
        assert_eq!(pos.castling_rights().to_string(), "-");
        assert_eq!(pos.key(), pos.recompute_key());
    }

    #[test]
    fn test_castling_rights_update_on_rook_move() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        play_uci(&mut pos, &["a1b1", "a8b8"]);
        assert_eq!(pos.castling_rights().to_string(), "Kk");

        // Moving the Rook back does not restore the rights
        play_uci(&mut pos, &["b1a1", "b8a8"]);
        assert_eq!(pos.castling_rights().to_string(), "Kk");
    }

    #[test]
    fn test_castling_rights_update_on_rook_captured() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        play_uci(&mut pos, &["a1a8"]);
        assert_eq!(pos.castling_rights().to_string(), "Kk");
        assert_eq!(pos.key(), pos.recompute_key());

        play_uci(&mut pos, &["h8h1"]);
        assert_eq!(pos.castling_rights().to_string(), "-");
        assert_eq!(pos.key(), pos.recompute_key());
    }

    #[test]
    fn test_castling_moves_both_pieces() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        play_uci(&mut pos, &["e1g1", "e8c8"]);
        assert_eq!(pos.piece_at(Square::G1), Some(Piece::WHITE_KING));
        assert_eq!(pos.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(pos.piece_at(Square::C8), Some(Piece::BLACK_KING));
        assert_eq!(pos.piece_at(Square::D8), Some(Piece::BLACK_ROOK));
        assert_eq!(pos.piece_at(Square::E1), None);
        assert_eq!(pos.piece_at(Square::A8), None);
        assert_eq!(pos.castling_rights(), CastlingRights::NONE);
        assert_eq!(pos.key(), pos.recompute_key());
    }

    #[test]
    fn test_promotion_and_unmake() {
        let fen = "4k2r/P7/8/8/8/8/8/4K3 w k - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();

        play_uci(&mut pos, &["a7a8n"]);
        assert_eq!(pos.piece_at(Square::A8), Some(Piece::WHITE_KNIGHT));
        assert_eq!(pos.halfmove(), 0);

        pos.unmake_move();
        assert_eq!(pos.piece_at(Square::A7), Some(Piece::WHITE_PAWN));
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_null_move() {
        let mut pos = Position::from_fen(
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        )
        .unwrap();
        let original = pos.clone();

        pos.make_null_move();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.key(), pos.recompute_key());

        assert!(pos.unmake_move().is_null());
        assert_eq!(pos, original);
    }

    #[test]
    fn test_validate() {
        let pos = Position::default();
        assert_eq!(pos.validate(), Ok(()));

        let mut corrupted = pos.clone();
        corrupted.key.hash_side_to_move();
        assert!(matches!(
            corrupted.validate(),
            Err(InvariantViolation::HashMismatch { .. })
        ));
    }
}
