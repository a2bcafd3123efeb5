/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rand::{rngs::StdRng, Rng, SeedableRng};
use tadpole::*;

const NOTATIONS: [Notation; 4] = [
    Notation::San,
    Notation::Lan,
    Notation::Coordinate,
    Notation::Figurine,
];

/// Positions reached by short random games from a handful of starting points.
fn sample_positions(seed: u64) -> Vec<Position> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::new();

    for fen in [
        FEN_STARTPOS,
        FEN_KIWIPETE,
        FEN_PROMOTIONS,
        FEN_EN_PASSANT_PINS,
    ] {
        for _ in 0..8 {
            let mut pos = Position::from_fen(fen).unwrap();
            let plies = rng.gen_range(0..30);

            for _ in 0..plies {
                let moves = generate_legal(&mut pos);
                if moves.is_empty() {
                    break;
                }
                pos.make_move(moves[rng.gen_range(0..moves.len())]);
            }

            samples.push(pos);
        }
    }

    samples
}

#[test]
fn test_every_notation_round_trips() {
    for mut pos in sample_positions(0xA1_6EB2A) {
        let fen = pos.to_fen();

        for mv in generate_legal(&mut pos) {
            for notation in NOTATIONS {
                let text = move_to_text(&mut pos, mv, notation);
                let parsed = text_to_move(&mut pos, &text, notation);
                assert_eq!(parsed, Ok(mv), "{notation} {text:?} in {fen}");
            }
        }

        // Rendering and parsing never disturb the position
        assert_eq!(pos.to_fen(), fen);
    }
}

#[test]
fn test_san_is_unambiguous() {
    for mut pos in sample_positions(7) {
        let moves = generate_legal(&mut pos);
        let mut sans = moves
            .iter()
            .map(|&mv| to_san(&mut pos, mv))
            .collect::<Vec<_>>();

        sans.sort();
        sans.dedup();
        assert_eq!(sans.len(), moves.len(), "{}", pos.to_fen());
    }
}

#[test]
fn test_chess960_castling_round_trips() {
    let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/1R1K2R1 w GB - 0 1").unwrap();
    let castles = generate_legal(&mut pos)
        .into_iter()
        .filter(|mv| mv.is_castle())
        .collect::<Vec<_>>();
    assert_eq!(castles.len(), 2);

    for mv in castles {
        let san = to_san(&mut pos, mv);
        assert!(san == "O-O" || san == "O-O-O", "{san}");
        assert_eq!(parse_san(&mut pos, &san), Ok(mv));

        // King takes own Rook, on both boundaries
        let king_takes_rook = mv.to_uci(true);
        assert_eq!(king_takes_rook[2..], mv.to().to_uci());
        assert_eq!(parse_coordinate(&mut pos, &king_takes_rook), Ok(mv));
        assert_eq!(from_polyglot(&mut pos, to_polyglot(mv)), Ok(mv));
    }
}

#[test]
fn test_standard_castling_forms() {
    let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    let short = parse_san(&mut pos, "O-O").unwrap();
    let long = parse_san(&mut pos, "O-O-O").unwrap();

    assert_eq!(to_coordinate(short), "e1g1");
    assert_eq!(to_coordinate(long), "e1c1");
    assert_eq!(short.to_uci(true), "e1h1");
    assert_eq!(long.to_uci(true), "e1a1");

    assert_eq!(to_lan(&pos, short), "O-O");
    assert_eq!(to_lan(&pos, long), "O-O-O");
}

#[test]
fn test_move_lists() {
    let pos = Position::default();
    let game = ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6", "dxc6", "O-O"];

    let moves = parse_move_list(&pos, &game, Some(Notation::San), false).unwrap();
    assert_eq!(moves.len(), game.len());
    assert_eq!(moves_to_san(&pos, &moves), game);

    // The first bad move is reported, with the position it was parsed in
    let err = parse_move_list(&pos, &["e4", "e5", "Ke3"], None, false).unwrap_err();
    let MoveError::Illegal(err) = err else {
        panic!("expected an illegal move error, got {err:?}");
    };
    assert_eq!(
        err.fen,
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );

    // Rendering stops at the first move that doesn't fit the position
    let mut moves = moves;
    moves.insert(2, Move::new(Square::E4, Square::E5, MoveKind::Quiet));
    assert_eq!(moves_to_san(&pos, &moves), ["e4", "e5"]);
}

#[test]
fn test_move_lists_in_mixed_notation() {
    let pos = Position::default();
    let mixed = [
        "e2e4", "e7-e5", "Ng1-f3", "♞c6", "f1b5", "a6", "Bb5xc6", "dxc6", "0-0",
    ];

    let moves = parse_move_list(&pos, &mixed, None, false).unwrap();
    assert_eq!(
        moves_to_san(&pos, &moves),
        ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6", "dxc6", "O-O"]
    );

    // Naming a notation turns detection off
    assert!(parse_move_list(&pos, &mixed, Some(Notation::San), false).is_err());
    assert!(parse_move_list(&pos, &mixed, Some(Notation::Coordinate), false).is_err());
}

#[test]
fn test_move_lists_keep_legal_prefix() {
    let pos = Position::default();
    let moves = ["d4", "d7d5", "c2-c4", "e2e5", "Nc3"];

    let prefix = parse_move_list(&pos, &moves, None, true).unwrap();
    assert_eq!(moves_to_san(&pos, &prefix), ["d4", "d5", "c4"]);

    let err = parse_move_list(&pos, &moves, None, false).unwrap_err();
    let MoveError::Illegal(err) = err else {
        panic!("expected an illegal move error, got {err:?}");
    };
    assert_eq!(err.mv, "e2e5");

    // A bad first move leaves nothing to keep
    let prefix = parse_move_list(&pos, &["Qxx4", "e4"], None, true).unwrap();
    assert!(prefix.is_empty());
}

#[test]
fn test_detect_notation() {
    for (text, notation) in [
        ("O-O", Notation::San),
        ("o-o-o", Notation::San),
        ("0-0+", Notation::San),
        ("--", Notation::San),
        ("Nf3", Notation::San),
        ("exd5", Notation::San),
        ("e8=Q#", Notation::San),
        ("Nbd7", Notation::San),
        ("e2-e4", Notation::Lan),
        ("Ng1-f3", Notation::Lan),
        ("Qh4xe1+", Notation::Lan),
        ("e7-e8=Q", Notation::Lan),
        ("e2e4", Notation::Coordinate),
        ("e7e8q", Notation::Coordinate),
        ("e7e8=q", Notation::Coordinate),
        ("♘f3", Notation::Figurine),
        ("♛h4‡", Notation::Figurine),
    ] {
        assert_eq!(detect_notation(text), notation, "{text:?}");
    }
}

#[test]
fn test_null_move_text() {
    let mut pos = Position::default();
    assert_eq!(to_san(&mut pos, Move::null()), "--");
    assert_eq!(parse_san(&mut pos, "--"), Ok(Move::null()));
    assert_eq!(parse_coordinate(&mut pos, "0000"), Ok(Move::null()));

    let moves = [
        Move::null(),
        Move::new(Square::E7, Square::E5, MoveKind::PawnDoublePush),
    ];
    assert_eq!(moves_to_san(&pos, &moves), ["--", "e5"]);
}

#[test]
fn test_parse_errors() {
    let mut pos = Position::default();

    for bad in ["", "e", "Nz4", "e2e", "e2e4e5e6", "Qxx4", "O-O-O-O"] {
        for notation in NOTATIONS {
            assert!(
                text_to_move(&mut pos, bad, notation).is_err(),
                "{notation} accepted {bad:?}"
            );
        }
    }

    // Well-formed, but not playable
    for (text, notation) in [
        ("e5", Notation::San),
        ("Nf6", Notation::San),
        ("e2-e5", Notation::Lan),
        ("e2e5", Notation::Coordinate),
    ] {
        assert!(
            matches!(
                text_to_move(&mut pos, text, notation),
                Err(MoveError::Illegal(_))
            ),
            "{notation} {text:?}"
        );
    }
}
