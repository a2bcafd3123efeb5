/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rand::{rngs::StdRng, Rng, SeedableRng};
use tadpole::*;

/// Plays a list of SAN moves from `fen`, panicking if any is rejected.
fn play_san(fen: &str, moves: &[&str]) -> Position {
    let mut pos = Position::from_fen(fen).unwrap();
    for mv in parse_move_list(&pos, moves, Some(Notation::San), false).unwrap() {
        pos.play(mv).unwrap();
    }
    pos
}

#[test]
fn test_fools_mate() {
    let mut pos = play_san(FEN_STARTPOS, &["f3", "e5", "g4"]);
    assert_eq!(evaluate_outcome(&mut pos), Outcome::Running);

    let qh4 = parse_san(&mut pos, "Qh4").unwrap();
    assert_eq!(to_san(&mut pos, qh4), "Qh4#");
    pos.make_move(qh4);

    assert!(pos.in_check());
    assert!(generate_legal(&mut pos).is_empty());
    assert_eq!(
        evaluate_outcome(&mut pos),
        Outcome::Checkmate {
            winner: Color::Black
        }
    );
}

#[test]
fn test_stalemate() {
    let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();

    assert!(!pos.in_check());
    assert!(generate_legal(&mut pos).is_empty());

    let outcome = evaluate_outcome(&mut pos);
    assert_eq!(outcome, Outcome::Stalemate);
    assert!(outcome.is_draw());
    assert_eq!(outcome.winner(), None);
}

#[test]
fn test_en_passant() {
    let mut pos = play_san(FEN_STARTPOS, &["e4", "a6", "e5", "d5"]);
    assert_eq!(
        pos.to_fen(),
        "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"
    );
    let before = pos.clone();

    let exd6 = parse_san(&mut pos, "exd6").unwrap();
    assert!(exd6.is_en_passant());
    assert_eq!(exd6.to(), Square::D6);

    pos.make_move(exd6);
    assert_eq!(pos.piece_at(Square::D5), None);
    assert_eq!(pos.piece_at(Square::D6), Some(Piece::WHITE_PAWN));
    assert_eq!(pos.validate(), Ok(()));

    pos.unmake_move();
    assert_eq!(pos, before);

    // The right expires if not taken immediately
    let mut pos = play_san(FEN_STARTPOS, &["e4", "a6", "e5", "d5", "a3", "a5"]);
    assert!(parse_san(&mut pos, "exd6").is_err());
}

#[test]
fn test_make_unmake_round_trip() {
    let fens = [
        FEN_STARTPOS,
        FEN_KIWIPETE,
        FEN_PROMOTIONS,
        FEN_EN_PASSANT_PINS,
        "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        "2r1kr2/8/8/8/8/8/8/1R2K1R1 w GBfc - 0 1",
    ];

    for fen in fens {
        let mut pos = Position::from_fen(fen).unwrap();
        let original = pos.clone();

        for mv in generate_legal(&mut pos) {
            pos.make_move(mv);
            assert_eq!(pos.validate(), Ok(()), "{mv} from {fen}");
            assert_eq!(pos.unmake_move(), mv);
            assert_eq!(pos, original, "{mv} from {fen}");
            assert_eq!(pos.key(), original.key());
            assert_eq!(pos.to_fen(), original.to_fen());
        }
    }
}

#[test]
fn test_legality_over_random_games() {
    let mut rng = StdRng::seed_from_u64(0x7AD_901E);

    for game in 0..40 {
        let mut pos = Position::default();

        for _ in 0..120 {
            let color = pos.side_to_move();
            let legal = generate_legal(&mut pos);
            let pseudo = generate_pseudo_legal(&pos);

            // Outside of castling, a move is legal exactly when it leaves the mover's King safe
            let mut expected = Vec::new();
            for &mv in pseudo.iter().filter(|mv| !mv.is_castle()) {
                pos.make_move(mv);
                if !pos.is_in_check(color) {
                    expected.push(mv);
                }
                pos.unmake_move();
            }

            let mut found = legal
                .iter()
                .copied()
                .filter(|mv| !mv.is_castle())
                .collect::<Vec<_>>();
            expected.sort_by_key(Move::bits);
            found.sort_by_key(Move::bits);
            assert_eq!(found, expected, "game {game}: {}", pos.to_fen());

            // Castling is never legal out of, or into, check
            for &mv in legal.iter().filter(|mv| mv.is_castle()) {
                assert!(!pos.in_check(), "game {game}: {mv} out of check");
                assert!(pseudo.contains(&mv));
                pos.make_move(mv);
                assert!(!pos.is_in_check(color), "game {game}: {mv} into check");
                pos.unmake_move();
            }

            if legal.is_empty() || evaluate_outcome(&mut pos).is_over() {
                break;
            }

            let mv = legal[rng.gen_range(0..legal.len())];
            pos.make_move(mv);
            assert_eq!(pos.validate(), Ok(()), "game {game}: after {mv}");
        }

        // Unwinding the whole game restores the start position
        while pos.try_unmake_move().is_ok() {}
        assert_eq!(pos, Position::default(), "game {game}");
    }
}

#[test]
fn test_castling_rights_lost() {
    // Moving the King loses both rights
    let pos = play_san(FEN_KIWIPETE, &["Kf1"]);
    assert!(!pos.castling_rights().intersects(CastlingRights::both(Color::White)));
    assert!(pos.castling_rights().contains(CastlingRights::both(Color::Black)));

    // Moving a Rook loses only its own side
    let pos = play_san(FEN_KIWIPETE, &["Rb1"]);
    assert!(!pos.castling_rights().contains(CastlingRights::WHITE_LONG));
    assert!(pos.castling_rights().contains(CastlingRights::WHITE_SHORT));

    // Castling itself gives up both rights
    let pos = play_san(FEN_KIWIPETE, &["O-O"]);
    assert_eq!(pos.piece_at(Square::G1), Some(Piece::WHITE_KING));
    assert_eq!(pos.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
    assert!(!pos.castling_rights().intersects(CastlingRights::both(Color::White)));
}

#[test]
fn test_threefold_repetition() {
    let shuffle = ["Nf3", "Nf6", "Ng1", "Ng8"];

    let mut pos = play_san(FEN_STARTPOS, &shuffle);
    assert!(pos.is_repetition(2));
    assert_eq!(evaluate_outcome(&mut pos), Outcome::Running);

    let moves = [shuffle, shuffle].concat();
    let mut pos = play_san(FEN_STARTPOS, &moves);
    assert!(pos.is_repetition(3));
    assert_eq!(evaluate_outcome(&mut pos), Outcome::DrawByRepetition);

    // A pawn move makes every earlier position unreachable
    let moves = [&moves[..], &["e4", "e5"][..], &shuffle[..]].concat();
    let mut pos = play_san(FEN_STARTPOS, &moves);
    assert!(pos.is_repetition(2));
    assert!(!pos.is_repetition(3));
    assert_eq!(evaluate_outcome(&mut pos), Outcome::Running);
}

#[test]
fn test_fifty_move_rule() {
    let mut pos = Position::from_fen("4k3/8/8/8/8/8/4P3/R3K3 w - - 99 80").unwrap();
    assert!(!pos.can_draw_by_fifty());

    // A quiet Rook move reaches the hundredth ply
    let ra2 = parse_san(&mut pos, "Ra2").unwrap();
    pos.make_move(ra2);
    assert!(pos.can_draw_by_fifty());
    assert_eq!(evaluate_outcome(&mut pos), Outcome::DrawByFiftyMoves);
    pos.unmake_move();

    // A Pawn move resets the counter
    let e4 = parse_san(&mut pos, "e4").unwrap();
    pos.make_move(e4);
    assert!(!pos.can_draw_by_fifty());
    assert_eq!(evaluate_outcome(&mut pos), Outcome::Running);
}

#[test]
fn test_insufficient_material() {
    let draws = [
        "8/4k3/8/8/3K4/8/8/8 w - - 0 1",
        "8/4k3/8/8/3K4/8/5N2/8 w - - 0 1",
        "8/4kb2/8/8/3K4/8/8/8 b - - 0 1",
        "8/2b1k3/8/8/3K4/8/5B2/8 w - - 0 1",
    ];
    for fen in draws {
        let mut pos = Position::from_fen(fen).unwrap();
        assert_eq!(
            evaluate_outcome(&mut pos),
            Outcome::DrawByInsufficientMaterial,
            "{fen}"
        );
    }

    let playable = [
        "8/3bk3/8/8/3K4/8/5B2/8 w - - 0 1",
        "8/4k3/8/8/3K4/8/4P3/8 w - - 0 1",
        "8/4k3/8/8/3K4/8/4R3/8 w - - 0 1",
    ];
    for fen in playable {
        let mut pos = Position::from_fen(fen).unwrap();
        assert_eq!(evaluate_outcome(&mut pos), Outcome::Running, "{fen}");
    }
}

#[test]
fn test_illegal_moves_rejected() {
    let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    let before = pos.clone();

    // The Knight on c3 cannot jump to c5
    let err = pos
        .play(Move::new(Square::C3, Square::C5, MoveKind::Quiet))
        .unwrap_err();
    assert_eq!(err.fen, FEN_KIWIPETE);

    // Black's pieces cannot move on White's turn
    assert!(pos
        .play(Move::new(Square::A6, Square::B5, MoveKind::Quiet))
        .is_err());

    assert_eq!(pos, before);
}
