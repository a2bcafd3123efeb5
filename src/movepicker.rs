/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{Move, MoveList, PieceKind, Position, MAX_NUM_MOVES};

/// Yields moves best-first, by lazily selecting the highest remaining score on each call.
///
/// Most nodes cut off after a handful of moves, so the list is never fully sorted.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_NUM_MOVES>,
    current: usize,
}

impl MovePicker {
    /// Score every move in `moves` with `score_fn`. Higher scores are yielded first.
    pub fn new(moves: MoveList, score_fn: impl Fn(&Move) -> i32) -> Self {
        let scores = moves.iter().map(score_fn).collect();

        Self {
            moves,
            scores,
            current: 0,
        }
    }

    /// Returns `true` if there were no moves to pick from at all.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Iterator for MovePicker {
    type Item = (Move, i32);

    fn next(&mut self) -> Option<Self::Item> {
        // No more moves left
        if self.current >= self.moves.len() {
            return None;
        }

        // Fetch the current best
        let mut best_index = self.current;
        let mut best_score = self.scores[best_index];

        // Find the index of the next highest score. Ties keep generation order.
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_index = i;
                best_score = self.scores[i];
            }
        }

        // Swap, if necessary
        if best_index != self.current {
            self.moves.swap(self.current, best_index);
            self.scores.swap(self.current, best_index);
        }

        let mv = self.moves[self.current];
        let score = self.scores[self.current];

        // Increment for next call
        self.current += 1;

        Some((mv, score))
    }
}

/// This table represents values for [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) move ordering.
///
/// It is indexed by `[attacker][victim]`, and yields a "score" that is used when sorting moves.
///
/// The following table is produced (before shifting):
/// ```text
///                     VICTIM
/// A       P     N     B     R     Q     K
/// T    +---------------------------------+
/// T   P| 900   3100  3200  4900  8900  0
/// A   N| 680   2880  2980  4680  8680  0
/// C   B| 670   2870  2970  4670  8670  0
/// K   R| 500   2700  2800  4500  8500  0
/// E   Q| 100   2300  2400  4100  8100  0
/// R   K| 1000  3200  3300  5000  9000  0
/// ```
///
/// The values are all left-shifted by 16 bits, to ensure that captures are ranked above quiets in all cases.
pub const MVV_LVA: [[i32; PieceKind::COUNT]; PieceKind::COUNT] = {
    let mut matrix = [[0; PieceKind::COUNT]; PieceKind::COUNT];

    let mut attacker = 0;
    while attacker < PieceKind::COUNT {
        let atk = PieceKind::from_index_unchecked(attacker);

        let mut victim = 0;
        while victim < PieceKind::COUNT {
            let vtm = PieceKind::from_index_unchecked(victim);

            // The King can never be captured
            let can_capture = victim != PieceKind::King as usize;

            let score = 10 * vtm.value() - atk.value();

            // Shift the value by a large amount so that captures are always ranked very highly
            matrix[attacker][victim] = (score * can_capture as i32) << 16;
            victim += 1;
        }
        attacker += 1;
    }
    matrix
};

/// Ordering value of a move's material gain: MVV-LVA for captures plus the promoted piece, if any.
///
/// Quiet moves are worth `0`.
#[inline(always)]
pub fn capture_value(position: &Position, mv: Move) -> i32 {
    let Some(attacker) = position.kind_at(mv.from()) else {
        return 0;
    };

    let victim = if mv.is_en_passant() {
        Some(PieceKind::Pawn)
    } else if mv.is_capture() {
        position.kind_at(mv.to())
    } else {
        None
    };

    let capture = victim.map_or(0, |victim| MVV_LVA[attacker.index()][victim.index()]);
    let promotion = mv.promotion().map_or(0, |kind| (10 * kind.value()) << 16);

    capture + promotion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    #[test]
    fn test_picker_order() {
        let pos = Position::default();
        let moves = generate_pseudo_legal(&pos);
        let count = moves.len();

        // Prefer Knight moves, then everything else in generation order
        let picked = MovePicker::new(moves, |mv| {
            pos.kind_at(mv.from())
                .map_or(0, |kind| (kind == PieceKind::Knight) as i32)
        })
        .collect::<Vec<_>>();

        assert_eq!(picked.len(), count);
        assert!(picked[..4].iter().all(|&(_, score)| score == 1));
        assert!(picked[4..].iter().all(|&(_, score)| score == 0));
    }

    #[test]
    fn test_capture_order() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let moves = generate_captures(&mut pos);

        let best = MovePicker::new(moves, |mv| capture_value(&pos, *mv))
            .next()
            .map(|(mv, _)| mv.to_string());

        // Bishop takes Bishop is the most valuable capture by MVV-LVA
        assert_eq!(best.as_deref(), Some("e2a6"));
    }

    #[test]
    fn test_least_valuable_attacker_first() {
        // Both the Pawn and the Queen can take the Rook on d5
        let pos = Position::from_fen("4k3/8/8/3r4/4P3/8/8/3QK3 w - - 0 1").unwrap();
        let pawn = Move::new(Square::E4, Square::D5, MoveKind::Capture);
        let queen = Move::new(Square::D1, Square::D5, MoveKind::Capture);

        assert!(capture_value(&pos, pawn) > capture_value(&pos, queen));
        assert!(capture_value(&pos, queen) > 0);
    }
}
