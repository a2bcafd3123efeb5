/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::Index;

use crate::{tune, Move, Piece, Square, MAX_DEPTH};

/// Stores bonuses and penalties for moving a piece to a square.
///
/// Used to keep track of good/bad moves found during search.
#[derive(Debug, Clone)]
pub struct HistoryTable([[i32; Square::COUNT]; Piece::COUNT]);

impl HistoryTable {
    /// Clear the history table, removing all scores.
    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The bonus awarded to a move that caused a cutoff `depth` plies from the horizon.
    #[inline(always)]
    pub fn bonus(depth: u8) -> i32 {
        tune::history_multiplier!() * depth as i32 - tune::history_offset!()
    }

    /// Applies a bonus based on the history heuristic for `piece` moving to `to`.
    ///
    /// Uses the "history gravity" formula from <https://www.chessprogramming.org/History_Heuristic#History_Bonuses>
    #[inline(always)]
    pub fn update(&mut self, piece: Piece, to: Square, bonus: i32) {
        let current = self.0[piece.index()][to.index()];

        let max = tune::max_history_bonus!();
        let clamped = bonus.clamp(-max, max);

        // History gravity formula
        let new = current + clamped - current * clamped.abs() / max;

        self.0[piece.index()][to.index()] = new;
    }
}

impl Default for HistoryTable {
    #[inline(always)]
    fn default() -> Self {
        Self([[0; Square::COUNT]; Piece::COUNT])
    }
}

impl Index<(Piece, Square)> for HistoryTable {
    type Output = i32;

    #[inline(always)]
    fn index(&self, (piece, square): (Piece, Square)) -> &Self::Output {
        &self.0[piece.index()][square.index()]
    }
}

/// Two [killer move](https://www.chessprogramming.org/Killer_Move) slots per remaining depth.
///
/// Quiet moves that caused a beta cutoff are remembered so that siblings at the same depth try them early.
#[derive(Debug, Clone)]
pub struct KillerTable([[Option<Move>; 2]; MAX_DEPTH as usize + 1]);

impl KillerTable {
    /// Clear all killer slots.
    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record `mv` as the newest killer at `depth`, pushing the previous newest into the second slot.
    #[inline(always)]
    pub fn store(&mut self, depth: u8, mv: Move) {
        let slots = &mut self.0[(depth as usize).min(MAX_DEPTH as usize)];

        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    /// Which slot at `depth` holds `mv`, if any. Slot `0` is the most recent killer.
    #[inline(always)]
    pub fn slot_of(&self, depth: u8, mv: Move) -> Option<usize> {
        self.0[(depth as usize).min(MAX_DEPTH as usize)]
            .iter()
            .position(|&killer| killer == Some(mv))
    }
}

impl Default for KillerTable {
    #[inline(always)]
    fn default() -> Self {
        Self([[None; 2]; MAX_DEPTH as usize + 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveKind;

    #[test]
    fn test_history_gravity_is_bounded() {
        let mut history = HistoryTable::default();
        let piece = Piece::WHITE_KNIGHT;

        for _ in 0..1000 {
            history.update(piece, Square::F3, HistoryTable::bonus(20));
        }
        let max = tune::max_history_bonus!();
        assert!(history[(piece, Square::F3)] <= max);
        assert!(history[(piece, Square::F3)] > 0);

        for _ in 0..1000 {
            history.update(piece, Square::F3, -HistoryTable::bonus(20));
        }
        assert!(history[(piece, Square::F3)] >= -max);
        assert!(history[(piece, Square::F3)] < 0);
    }

    #[test]
    fn test_killers_shift() {
        let mut killers = KillerTable::default();
        let first = Move::new(Square::G1, Square::F3, MoveKind::Quiet);
        let second = Move::new(Square::B1, Square::C3, MoveKind::Quiet);

        killers.store(3, first);
        killers.store(3, first);
        assert_eq!(killers.slot_of(3, first), Some(0));
        assert_eq!(killers.slot_of(3, second), None);

        killers.store(3, second);
        assert_eq!(killers.slot_of(3, second), Some(0));
        assert_eq!(killers.slot_of(3, first), Some(1));

        // Other depths are untouched
        assert_eq!(killers.slot_of(4, first), None);
    }
}
