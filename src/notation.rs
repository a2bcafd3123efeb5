/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{
    generate_legal, is_legal, File, IllegalMoveError, Move, MoveError, ParseError, Piece,
    PieceKind, Position, Rank, Square,
};

/// The textual move formats understood by [`move_to_text`] and [`text_to_move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum Notation {
    /// Short algebraic notation, like `Nf3`, `exd5`, or `e8=Q+`.
    #[default]
    San,

    /// Long algebraic notation, like `Ng1-f3` or `e4xd5`.
    Lan,

    /// Pure coordinates, like `g1f3` or `e7e8q`.
    Coordinate,

    /// Short algebraic notation with piece letters replaced by chess glyphs, like `♘f3`.
    Figurine,
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::San => "san",
            Self::Lan => "lan",
            Self::Coordinate => "coordinate",
            Self::Figurine => "figurine",
        };
        write!(f, "{name}")
    }
}

/// Renders `mv` as text in the given `notation`.
///
/// `position` must be the position *before* `mv` is played. It is temporarily mutated to
/// compute check suffixes and disambiguation, and is restored before returning.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let mut pos = Position::default();
/// let mv = Move::new(Square::G1, Square::F3, MoveKind::Quiet);
/// assert_eq!(move_to_text(&mut pos, mv, Notation::San), "Nf3");
/// assert_eq!(move_to_text(&mut pos, mv, Notation::Lan), "Ng1-f3");
/// assert_eq!(move_to_text(&mut pos, mv, Notation::Coordinate), "g1f3");
/// assert_eq!(move_to_text(&mut pos, mv, Notation::Figurine), "♘f3");
/// ```
pub fn move_to_text(position: &mut Position, mv: Move, notation: Notation) -> String {
    match notation {
        Notation::San => to_san(position, mv),
        Notation::Lan => to_lan(position, mv),
        Notation::Coordinate => to_coordinate(mv),
        Notation::Figurine => to_figurine(position, mv),
    }
}

/// Parses `text` in the given `notation` into a legal move of `position`.
///
/// Nothing is guessed: malformed or ambiguous text yields a [`ParseError`],
/// and well-formed text naming a move that cannot be played yields an [`IllegalMoveError`].
pub fn text_to_move(
    position: &mut Position,
    text: &str,
    notation: Notation,
) -> Result<Move, MoveError> {
    match notation {
        Notation::San => parse_san(position, text),
        Notation::Lan => parse_lan(position, text),
        Notation::Coordinate => parse_coordinate(position, text),
        Notation::Figurine => parse_figurine(position, text),
    }
}

/// Short algebraic notation for `mv`, including the `+` or `#` suffix.
///
/// Pieces are disambiguated minimally: by source file, then by source rank, then by the full square,
/// considering only pieces that can *legally* reach the destination.
///
/// # Example
/// ```
/// # use tadpole::*;
/// // Both Rooks can reach d1
/// let mut pos: Position = "4k3/8/8/8/8/8/4K3/R6R w - - 0 1".parse().unwrap();
/// let mv = Move::new(Square::A1, Square::D1, MoveKind::Quiet);
/// assert_eq!(to_san(&mut pos, mv), "Rad1");
/// ```
pub fn to_san(position: &mut Position, mv: Move) -> String {
    if mv.is_null() {
        return String::from("--");
    }

    let mut san = if mv.is_short_castle() {
        String::from("O-O")
    } else if mv.is_long_castle() {
        String::from("O-O-O")
    } else {
        let Some(kind) = position.kind_at(mv.from()) else {
            return mv.to_uci(false);
        };

        let mut san = String::with_capacity(8);
        if kind == PieceKind::Pawn {
            if mv.is_capture() {
                san.push(mv.from().file().char());
            }
        } else {
            san.push(kind.san_char());
            if kind != PieceKind::King {
                san.push_str(&disambiguation(position, mv, kind));
            }
        }

        if mv.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to().to_uci());

        if let Some(promotion) = mv.promotion() {
            san.push('=');
            san.push(promotion.san_char());
        }

        san
    };

    san.push_str(check_suffix(position, mv));
    san
}

/// The shortest prefix that tells `mv` apart from other legal moves of the same piece kind to the same square.
fn disambiguation(position: &mut Position, mv: Move, kind: PieceKind) -> String {
    let from = mv.from();
    let rivals = generate_legal(position)
        .into_iter()
        .filter(|other| {
            other.from() != from
                && other.to() == mv.to()
                && !other.is_castle()
                && position.kind_at(other.from()) == Some(kind)
        })
        .map(|other| other.from())
        .collect::<Vec<_>>();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.file() == from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == from.rank());

    if !shares_file {
        from.file().to_string()
    } else if !shares_rank {
        from.rank().to_string()
    } else {
        from.to_uci()
    }
}

/// `"#"` if `mv` mates, `"+"` if it checks, and `""` otherwise.
fn check_suffix(position: &mut Position, mv: Move) -> &'static str {
    position.make_move(mv);

    let suffix = if !position.in_check() {
        ""
    } else if generate_legal(position).is_empty() {
        "#"
    } else {
        "+"
    };

    position.unmake_move();
    suffix
}

/// Parses short algebraic notation.
///
/// Castling may be written with letters or zeros (`O-O`, `0-0`, `o-o`), trailing `+`, `#`, and `++` are ignored,
/// the `=` before a promotion piece is optional, and `--` is the null move.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let mut pos = Position::default();
/// let mv = parse_san(&mut pos, "Nf3").unwrap();
/// assert_eq!(mv, Move::new(Square::G1, Square::F3, MoveKind::Quiet));
///
/// assert!(matches!(parse_san(&mut pos, "Nf4"), Err(MoveError::Illegal(_))));
/// assert!(matches!(parse_san(&mut pos, "Zz9"), Err(MoveError::Parse(_))));
/// ```
pub fn parse_san(position: &mut Position, san: &str) -> Result<Move, MoveError> {
    let token = san.trim();
    if token == "--" {
        return Ok(Move::null());
    }

    if !token.is_ascii() {
        return Err(parse_error(token, "unexpected non-ASCII character", position));
    }

    let mut body = token.trim_end_matches(['+', '#']);

    if body.starts_with(['O', 'o', '0']) {
        return parse_castling(position, token, body);
    }

    // A trailing piece letter is the promotion piece, optionally preceded by `=`
    let mut promotion = None;
    if let Some(last) = body.chars().last().filter(|c| "QRBNKqrbnk".contains(*c)) {
        if body.len() > 2 {
            if last.eq_ignore_ascii_case(&'k') {
                return Err(parse_error(token, "cannot promote to a king", position));
            }
            promotion = PieceKind::from_char(last).ok();
            body = &body[..body.len() - 1];
            body = body.strip_suffix('=').unwrap_or(body);
        }
    }

    // Long algebraic separators sometimes sneak into SAN
    let body = body.replace('-', "");

    let (kind, rest) = match body.chars().next() {
        Some(c @ ('K' | 'Q' | 'R' | 'B' | 'N')) => (PieceKind::from_char(c).ok(), &body[1..]),
        Some('P') => (Some(PieceKind::Pawn), &body[1..]),
        _ => (Some(PieceKind::Pawn), body.as_str()),
    };
    let kind = kind.unwrap_or(PieceKind::Pawn);

    if rest.len() < 2 {
        return Err(parse_error(token, "the move needs a piece and a square", position));
    }

    let (prefix, dest) = rest.split_at(rest.len() - 2);
    let to = Square::from_uci(dest).map_err(|_| {
        parse_error(
            token,
            format!("the destination square ({dest}) is incorrect"),
            position,
        )
    })?;

    let is_capture = prefix.contains('x');
    let mut from_file = None;
    let mut from_rank = None;
    for c in prefix.chars().filter(|&c| c != 'x') {
        if let Ok(file) = File::from_char(c) {
            from_file = Some(file);
        } else if let Ok(rank) = Rank::from_char(c) {
            from_rank = Some(rank);
        } else {
            return Err(parse_error(
                token,
                format!("unexpected character {c:?} before the destination square"),
                position,
            ));
        }
    }

    if kind == PieceKind::Pawn {
        let last_rank = Rank::eighth(position.side_to_move());
        if to.rank() == last_rank && promotion.is_none() {
            return Err(parse_error(
                token,
                "promotion move without promoted piece is incorrect",
                position,
            ));
        }
        if to.rank() != last_rank && promotion.is_some() {
            return Err(parse_error(token, "only pawns reaching the last rank can promote", position));
        }

        // Pawns only leave their file when capturing
        if !is_capture && from_file.is_none() {
            from_file = Some(to.file());
        }
    } else if promotion.is_some() {
        return Err(parse_error(token, "only pawns can promote", position));
    }

    let candidates = generate_legal(position)
        .into_iter()
        .filter(|mv| {
            !mv.is_castle()
                && mv.to() == to
                && mv.promotion() == promotion
                && position.kind_at(mv.from()) == Some(kind)
                && from_file.map_or(true, |file| mv.from().file() == file)
                && from_rank.map_or(true, |rank| mv.from().rank() == rank)
        })
        .collect::<Vec<_>>();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(IllegalMoveError::new(
            token,
            format!("no {} is able to move to {to}", kind.name()),
            position,
        )
        .into()),
        many => Err(parse_error(
            token,
            format!(
                "ambiguous: {} {}s can move to {to}",
                many.len(),
                kind.name()
            ),
            position,
        )),
    }
}

fn parse_castling(position: &mut Position, token: &str, body: &str) -> Result<Move, MoveError> {
    let normalized = body.replace(['0', 'o'], "O");
    let short = match normalized.as_str() {
        "O-O" => true,
        "O-O-O" => false,
        _ => return Err(parse_error(token, "castling must be O-O or O-O-O", position)),
    };

    generate_legal(position)
        .into_iter()
        .find(|mv| if short { mv.is_short_castle() } else { mv.is_long_castle() })
        .ok_or_else(|| {
            let side = if short { "king" } else { "queen" };
            IllegalMoveError::new(
                token,
                format!("{} cannot castle {side}side", position.side_to_move()),
                position,
            )
            .into()
        })
}

/// Long algebraic notation for `mv`, like `Ng1-f3`, `e4xd5`, or `e7-e8=Q`.
///
/// Castling is written `O-O` / `O-O-O`. No check suffix is added.
pub fn to_lan(position: &Position, mv: Move) -> String {
    if mv.is_null() {
        return String::from("--");
    } else if mv.is_short_castle() {
        return String::from("O-O");
    } else if mv.is_long_castle() {
        return String::from("O-O-O");
    }

    let mut lan = String::with_capacity(8);
    if let Some(kind) = position.kind_at(mv.from()).filter(|&k| k != PieceKind::Pawn) {
        lan.push(kind.san_char());
    }

    lan.push_str(&mv.from().to_uci());
    lan.push(if mv.is_capture() { 'x' } else { '-' });
    lan.push_str(&mv.to().to_uci());

    if let Some(promotion) = mv.promotion() {
        lan.push('=');
        lan.push(promotion.san_char());
    }

    lan
}

/// Parses long algebraic notation, such as `Ng1-f3`, `e4xd5`, `e7-e8=Q`, or `O-O`.
///
/// The piece letter and separator are optional. If a piece letter is given, it must match the piece on the source square.
pub fn parse_lan(position: &mut Position, lan: &str) -> Result<Move, MoveError> {
    let token = lan.trim();
    if token == "--" {
        return Ok(Move::null());
    }

    if !token.is_ascii() {
        return Err(parse_error(token, "unexpected non-ASCII character", position));
    }

    let body = token.trim_end_matches(['+', '#']);
    if body.starts_with(['O', 'o', '0']) {
        return parse_castling(position, token, body);
    }

    let (kind, rest) = match body.chars().next() {
        Some(c @ ('K' | 'Q' | 'R' | 'B' | 'N' | 'P')) => (PieceKind::from_char(c).ok(), &body[1..]),
        _ => (None, body),
    };

    if rest.len() < 4 {
        return Err(parse_error(token, "the move needs a source and destination square", position));
    }

    let from = parse_square(position, token, &rest[..2])?;
    let rest = rest[2..].trim_start_matches(['-', 'x']);
    if rest.len() < 2 {
        return Err(parse_error(token, "the move needs a destination square", position));
    }
    let to = parse_square(position, token, &rest[..2])?;
    let promotion = parse_promotion(position, token, &rest[2..])?;

    if let Some(kind) = kind {
        if position.kind_at(from) != Some(kind) {
            return Err(IllegalMoveError::new(
                token,
                format!("there is no {} on {from}", kind.name()),
                position,
            )
            .into());
        }
    }

    check_missing_promotion(position, token, from, to, promotion)?;
    find_legal(position, token, from, to, promotion)
}

/// Coordinate text for `mv`, with castling written as the King's destination (`e1g1`).
#[inline(always)]
pub fn to_coordinate(mv: Move) -> String {
    mv.to_uci(false)
}

/// Parses coordinate notation, like `e2e4`, `e7e8q`, or `e7e8=q`.
///
/// Castling is accepted both as the King's destination (`e1g1`) and as "King takes Rook" (`e1h1`).
/// `0000` is the null move.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let mut pos: Position = FEN_KIWIPETE.parse().unwrap();
/// let castle = parse_coordinate(&mut pos, "e1g1").unwrap();
/// assert!(castle.is_short_castle());
/// assert_eq!(parse_coordinate(&mut pos, "e1h1").unwrap(), castle);
///
/// assert!(parse_coordinate(&mut pos, "e1").is_err());
/// ```
pub fn parse_coordinate(position: &mut Position, text: &str) -> Result<Move, MoveError> {
    let token = text.trim();
    if token == "0000" {
        return Ok(Move::null());
    }

    if !token.is_ascii() || !(4..=6).contains(&token.len()) {
        return Err(parse_error(token, "the move must be 4 to 6 characters long", position));
    }

    let from = parse_square(position, token, &token[..2])?;
    let to = parse_square(position, token, &token[2..4])?;
    let promotion = parse_promotion(position, token, &token[4..])?;

    check_missing_promotion(position, token, from, to, promotion)?;
    find_legal(position, token, from, to, promotion)
}

/// Short algebraic notation with the mover's chess glyphs in place of piece letters, and `†`/`‡` for `+`/`#`.
pub fn to_figurine(position: &mut Position, mv: Move) -> String {
    let color = position.side_to_move();

    to_san(position, mv)
        .chars()
        .map(|c| match c {
            '+' => '†',
            '#' => '‡',
            'K' | 'Q' | 'R' | 'B' | 'N' => PieceKind::from_char(c)
                .map(|kind| Piece::new(color, kind).figurine())
                .unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Parses figurine notation. Glyphs of either color are accepted.
pub fn parse_figurine(position: &mut Position, fan: &str) -> Result<Move, MoveError> {
    let san = fan
        .chars()
        .filter_map(|c| match c {
            '†' => Some('+'),
            '‡' => Some('#'),
            _ => match Piece::from_figurine(c) {
                Some(piece) if piece.kind() == PieceKind::Pawn => None,
                Some(piece) => Some(piece.kind().san_char()),
                None => Some(c),
            },
        })
        .collect::<String>();

    parse_san(position, &san).map_err(|err| match err {
        MoveError::Parse(mut err) => {
            err.token = fan.to_string();
            err.into()
        }
        MoveError::Illegal(mut err) => {
            err.mv = fan.to_string();
            err.into()
        }
    })
}

/// The 16-bit form of `mv` used by Polyglot opening books.
///
/// Bits 0-5 hold the destination, bits 6-11 the source, and bits 12-14 the promotion piece
/// (`1` Knight through `4` Queen). Castling is encoded as the King capturing its own Rook.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let castle = Move::new(Square::E1, Square::H1, MoveKind::ShortCastle);
/// assert_eq!(to_polyglot(castle), (4 << 6) | 7);
/// ```
pub fn to_polyglot(mv: Move) -> u16 {
    if mv.is_null() {
        return 0;
    }

    let promotion: u16 = match mv.promotion() {
        Some(PieceKind::Knight) => 1,
        Some(PieceKind::Bishop) => 2,
        Some(PieceKind::Rook) => 3,
        Some(PieceKind::Queen) => 4,
        _ => 0,
    };

    promotion << 12 | (mv.from().inner() as u16) << 6 | mv.to().inner() as u16
}

/// Decodes a Polyglot move against `position`, recovering castling, en passant, and promotion flags.
///
/// Castling is accepted as "King takes Rook" (`e1h1`) as well as the King's destination (`e1g1`).
pub fn from_polyglot(position: &mut Position, bits: u16) -> Result<Move, MoveError> {
    let token = format!("{bits:#06x}");
    let to = Square::from_index_unchecked((bits & 0x3F) as usize);
    let from = Square::from_index_unchecked(((bits >> 6) & 0x3F) as usize);

    let promotion = match (bits >> 12) & 0x7 {
        0 => None,
        1 => Some(PieceKind::Knight),
        2 => Some(PieceKind::Bishop),
        3 => Some(PieceKind::Rook),
        4 => Some(PieceKind::Queen),
        other => {
            return Err(parse_error(
                token,
                format!("invalid promotion piece {other}"),
                position,
            ))
        }
    };

    find_legal(position, &token, from, to, promotion)
}

/// Renders a sequence of moves from `position` in short algebraic notation.
///
/// Rendering stops at the first move that is not legal in the position it is played from.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let pos = Position::default();
/// let moves = parse_move_list(&pos, &["f3", "e5", "g4", "Qh4"], None, false).unwrap();
/// assert_eq!(moves_to_san(&pos, &moves), ["f3", "e5", "g4", "Qh4#"]);
/// ```
pub fn moves_to_san(position: &Position, moves: &[Move]) -> Vec<String> {
    let mut position = position.clone();
    let mut sans = Vec::with_capacity(moves.len());

    for &mv in moves {
        if !mv.is_null() && !is_legal(&mut position, mv) {
            break;
        }
        sans.push(to_san(&mut position, mv));
        position.make_move(mv);
    }

    sans
}

/// Guesses which [`Notation`] `text` is written in.
///
/// Castling and the null move are read as SAN. Two squares joined by `-` or `x` (after an optional piece letter) are LAN,
/// two adjacent squares are coordinates, and a leading chess glyph is figurine notation. Anything else is SAN.
///
/// # Example
/// ```
/// # use tadpole::*;
/// assert_eq!(detect_notation("0-0-0"), Notation::San);
/// assert_eq!(detect_notation("Ng1-f3"), Notation::Lan);
/// assert_eq!(detect_notation("e4xd5"), Notation::Lan);
/// assert_eq!(detect_notation("e7e8q"), Notation::Coordinate);
/// assert_eq!(detect_notation("♘f3"), Notation::Figurine);
/// assert_eq!(detect_notation("exd5"), Notation::San);
/// ```
pub fn detect_notation(text: &str) -> Notation {
    let token = text.trim();
    let body = token.trim_end_matches(['+', '#']);

    let castle = body.to_ascii_uppercase().replace('0', "O");
    if token == "--" || castle == "O-O" || castle == "O-O-O" {
        return Notation::San;
    }

    let is_square = |text: Option<&str>| text.is_some_and(|sq| Square::from_uci(sq).is_ok());

    let squares = body
        .strip_prefix(['K', 'Q', 'R', 'B', 'N', 'P'])
        .unwrap_or(body);
    if is_square(squares.get(..2))
        && matches!(squares.get(2..3), Some("-" | "x"))
        && is_square(squares.get(3..5))
    {
        return Notation::Lan;
    }

    if is_square(body.get(..2)) && is_square(body.get(2..4)) {
        return Notation::Coordinate;
    }

    if body.starts_with(|c: char| Piece::from_figurine(c).is_some()) || token.ends_with(['†', '‡']) {
        return Notation::Figurine;
    }

    Notation::San
}

/// Parses `text` in whichever notation [`detect_notation`] finds it to be written in.
pub fn parse_any(position: &mut Position, text: &str) -> Result<Move, MoveError> {
    text_to_move(position, text, detect_notation(text))
}

/// Parses a sequence of moves starting from `position`.
///
/// Every move is read in `notation`, or in its own detected notation if `notation` is `None`,
/// so lists mixing SAN, LAN, and coordinates are accepted.
///
/// The first bad move is returned as an error, unless `ignore_errors` is set,
/// in which case parsing stops there and the legal moves before it are returned.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let pos = Position::default();
/// let moves = parse_move_list(&pos, &["e2e4", "e7-e5", "Nf3", "Kf9"], None, true).unwrap();
/// assert_eq!(moves_to_san(&pos, &moves), ["e4", "e5", "Nf3"]);
///
/// assert!(parse_move_list(&pos, &["e2e4", "e7-e5", "Nf3", "Kf9"], None, false).is_err());
/// ```
pub fn parse_move_list(
    position: &Position,
    moves: &[&str],
    notation: Option<Notation>,
    ignore_errors: bool,
) -> Result<Vec<Move>, MoveError> {
    let mut position = position.clone();
    let mut parsed = Vec::with_capacity(moves.len());

    for text in moves {
        let result = match notation {
            Some(notation) => text_to_move(&mut position, text, notation),
            None => parse_any(&mut position, text),
        };

        match result {
            Ok(mv) => {
                position.make_move(mv);
                parsed.push(mv);
            }
            Err(_) if ignore_errors => break,
            Err(err) => return Err(err),
        }
    }

    Ok(parsed)
}

fn parse_error(token: impl Into<String>, reason: impl Into<String>, position: &Position) -> MoveError {
    ParseError::new(token, reason, position).into()
}

fn parse_square(position: &Position, token: &str, square: &str) -> Result<Square, MoveError> {
    Square::from_uci(square).map_err(|_| {
        parse_error(token, format!("the square ({square}) is incorrect"), position)
    })
}

/// Parses a promotion suffix: empty, a piece letter, or `=` and a piece letter.
fn parse_promotion(
    position: &Position,
    token: &str,
    suffix: &str,
) -> Result<Option<PieceKind>, MoveError> {
    let suffix = suffix.strip_prefix('=').unwrap_or(suffix);
    if suffix.is_empty() {
        return Ok(None);
    }

    let mut chars = suffix.chars();
    match (chars.next().map(PieceKind::from_char), chars.next()) {
        (Some(Ok(kind)), None) if PieceKind::promotions().contains(&kind) => Ok(Some(kind)),
        _ => Err(parse_error(
            token,
            format!("invalid promoted piece ({suffix})"),
            position,
        )),
    }
}

fn check_missing_promotion(
    position: &Position,
    token: &str,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<(), MoveError> {
    let is_pawn = position.kind_at(from) == Some(PieceKind::Pawn);
    let last_rank = to.rank() == Rank::ONE || to.rank() == Rank::EIGHT;

    if is_pawn && last_rank && promotion.is_none() {
        return Err(parse_error(
            token,
            "promotion move without promoted piece is incorrect",
            position,
        ));
    }

    Ok(())
}

/// Finds the legal move from `from` to `to` with the given promotion.
///
/// An exact destination match wins. Otherwise, a castling move whose King lands on `to` is accepted.
fn find_legal(
    position: &mut Position,
    token: &str,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<Move, MoveError> {
    let moves = generate_legal(position);
    let mut candidates = moves
        .iter()
        .filter(|mv| mv.from() == from && mv.promotion() == promotion);

    let exact = candidates.clone().find(|mv| mv.to() == to);
    let castle = candidates.find(|mv| {
        mv.castling_destinations()
            .is_some_and(|(king_to, _)| king_to == to)
    });

    if let Some(&mv) = exact.or(castle) {
        return Ok(mv);
    }

    let color = position.side_to_move();
    let reason = match position.piece_at(from) {
        None => format!("there is no piece on {from}"),
        Some(piece) if piece.color() != color => {
            format!("the {} on {from} does not belong to {color}", piece.kind().name())
        }
        Some(piece) => format!("the {} on {from} cannot move to {to}", piece.kind().name()),
    };

    Err(IllegalMoveError::new(token, reason, position).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MoveKind, FEN_KIWIPETE};

    fn san_of(fen: &str, from: Square, to: Square, kind: MoveKind) -> String {
        let mut pos: Position = fen.parse().unwrap();
        to_san(&mut pos, Move::new(from, to, kind))
    }

    #[test]
    fn test_san_disambiguation() {
        // By rank: both Rooks share the a-file
        assert_eq!(
            san_of(
                "4k3/8/8/R7/8/8/4K3/R7 w - - 0 1",
                Square::A1,
                Square::A3,
                MoveKind::Quiet
            ),
            "R1a3"
        );

        // By full square: one rival shares the file, another the rank
        assert_eq!(
            san_of(
                "4k3/8/8/8/8/Q7/8/Q1Q1K3 w - - 0 1",
                Square::A1,
                Square::B2,
                MoveKind::Quiet
            ),
            "Qa1b2"
        );

        // A pinned Knight is not a rival
        assert_eq!(
            san_of(
                "4k3/4r3/8/8/8/2N1N3/8/4K3 w - - 0 1",
                Square::C3,
                Square::D5,
                MoveKind::Quiet
            ),
            "Nd5"
        );
    }

    #[test]
    fn test_san_special_moves() {
        let ep = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        assert_eq!(
            san_of(ep, Square::E5, Square::D6, MoveKind::EnPassantCapture),
            "exd6"
        );

        let promo = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        assert_eq!(
            san_of(
                promo,
                Square::E7,
                Square::E8,
                MoveKind::PromoteQueen
            ),
            "e8=Q"
        );

        assert_eq!(
            san_of(FEN_KIWIPETE, Square::E1, Square::A1, MoveKind::LongCastle),
            "O-O-O"
        );
    }

    #[test]
    fn test_parse_san_tolerance() {
        let mut pos: Position = FEN_KIWIPETE.parse().unwrap();
        let castle = Move::new(Square::E1, Square::H1, MoveKind::ShortCastle);
        for text in ["O-O", "0-0", "o-o", "O-O+"] {
            assert_eq!(parse_san(&mut pos, text).unwrap(), castle, "{text}");
        }

        let mut pos: Position = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse().unwrap();
        let queen = Move::new(Square::E7, Square::E8, MoveKind::PromoteQueen);
        for text in ["e8=Q", "e8Q", "e8=q", "e8=Q++"] {
            assert_eq!(parse_san(&mut pos, text).unwrap(), queen, "{text}");
        }

        assert!(matches!(parse_san(&mut pos, "e8"), Err(MoveError::Parse(_))));
        assert!(matches!(parse_san(&mut pos, "e8=K"), Err(MoveError::Parse(_))));
        assert_eq!(parse_san(&mut pos, "--").unwrap(), Move::null());
    }

    #[test]
    fn test_parse_san_rejects_ambiguity() {
        let mut pos: Position = "4k3/8/8/8/8/8/4K3/R6R w - - 0 1".parse().unwrap();
        assert!(matches!(parse_san(&mut pos, "Rd1"), Err(MoveError::Parse(_))));
        assert_eq!(
            parse_san(&mut pos, "Rhd1").unwrap(),
            Move::new(Square::H1, Square::D1, MoveKind::Quiet)
        );
    }

    #[test]
    fn test_lan() {
        let mut pos: Position = FEN_KIWIPETE.parse().unwrap();
        let capture = Move::new(Square::E5, Square::F7, MoveKind::Capture);
        assert_eq!(to_lan(&pos, capture), "Ne5xf7");
        assert_eq!(parse_lan(&mut pos, "Ne5xf7").unwrap(), capture);
        assert_eq!(parse_lan(&mut pos, "e5f7").unwrap(), capture);

        let push = Move::new(Square::A2, Square::A4, MoveKind::PawnDoublePush);
        assert_eq!(to_lan(&pos, push), "a2-a4");
        assert_eq!(parse_lan(&mut pos, "a2-a4").unwrap(), push);

        // Wrong piece letter
        assert!(matches!(
            parse_lan(&mut pos, "Be5xf7"),
            Err(MoveError::Illegal(_))
        ));
    }

    #[test]
    fn test_coordinate_promotions() {
        let mut pos: Position = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse().unwrap();
        let knight = Move::new(Square::E7, Square::E8, MoveKind::PromoteKnight);
        assert_eq!(parse_coordinate(&mut pos, "e7e8n").unwrap(), knight);
        assert_eq!(parse_coordinate(&mut pos, "e7e8=n").unwrap(), knight);
        assert_eq!(to_coordinate(knight), "e7e8n");

        let err = parse_coordinate(&mut pos, "e7e8").unwrap_err();
        assert!(matches!(err, MoveError::Parse(_)));

        assert!(parse_coordinate(&mut pos, "e7e8k").is_err());
        assert!(parse_coordinate(&mut pos, "e7e8qq").is_err());
        assert!(parse_coordinate(&mut pos, "e7e8===").is_err());
    }

    #[test]
    fn test_figurine() {
        let mut pos = Position::default();
        pos.make_move(Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush));

        let mv = Move::new(Square::G8, Square::F6, MoveKind::Quiet);
        assert_eq!(to_figurine(&mut pos, mv), "♞f6");
        assert_eq!(parse_figurine(&mut pos, "♞f6").unwrap(), mv);
        assert_eq!(parse_figurine(&mut pos, "♘f6").unwrap(), mv);

        let err = parse_figurine(&mut pos, "♞f5").unwrap_err();
        let MoveError::Illegal(err) = err else {
            panic!("expected an illegal move error");
        };
        assert_eq!(err.mv, "♞f5");
    }

    #[test]
    fn test_polyglot_castling_remap() {
        let mut pos: Position = FEN_KIWIPETE.parse().unwrap();
        let short = Move::new(Square::E1, Square::H1, MoveKind::ShortCastle);
        let long = Move::new(Square::E1, Square::A1, MoveKind::LongCastle);

        assert_eq!(to_polyglot(short), (4 << 6) | 7);
        assert_eq!(to_polyglot(long), 4 << 6);

        assert_eq!(from_polyglot(&mut pos, (4 << 6) | 7).unwrap(), short);
        assert_eq!(from_polyglot(&mut pos, (4 << 6) | 6).unwrap(), short);
        assert_eq!(from_polyglot(&mut pos, 4 << 6).unwrap(), long);
        assert_eq!(from_polyglot(&mut pos, (4 << 6) | 2).unwrap(), long);
    }

    #[test]
    fn test_polyglot_promotion_and_en_passant() {
        let mut pos: Position = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1".parse().unwrap();
        let queen = Move::new(Square::E7, Square::E8, MoveKind::PromoteQueen);
        let bits = to_polyglot(queen);
        assert_eq!(bits, 4 << 12 | 52 << 6 | 60);
        assert_eq!(from_polyglot(&mut pos, bits).unwrap(), queen);
        assert!(from_polyglot(&mut pos, 7 << 12 | 52 << 6 | 60).is_err());

        let mut pos: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1".parse().unwrap();
        let mv = from_polyglot(&mut pos, 36 << 6 | 43).unwrap();
        assert!(mv.is_en_passant());
    }

    #[test]
    fn test_errors_carry_context() {
        let mut pos = Position::default();
        let MoveError::Parse(err) = parse_san(&mut pos, "Nz4").unwrap_err() else {
            panic!("expected a parse error");
        };
        assert_eq!(err.token, "Nz4");
        assert_eq!(err.fen, pos.to_fen());
    }
}
