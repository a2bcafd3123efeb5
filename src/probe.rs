/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use crate::{from_polyglot, is_legal, to_polyglot, Move, Position, Score, ZobristKey};

/// Size of one book record on disk: key (8), move (2), weight (2), games (2), score (2).
const RECORD_SIZE: usize = 16;

/// A candidate move suggested by an opening book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub mv: Move,

    /// Proportional to the probability the move should be played.
    pub weight: u16,

    /// Number of times the move has been tried. Not every book keeps this.
    pub games: u16,

    /// Points scored by the move, 2 per win and 1 per draw. Not every book keeps this.
    pub score: u16,
}

/// Anything that can suggest moves for a position before searching it.
pub trait BookProbe: Send {
    /// Every book entry for `position`, already decoded and checked for legality.
    fn entries(&self, position: &mut Position) -> Vec<BookEntry>;

    /// The move to play from the book, if any.
    ///
    /// The highest weight wins. Ties go to the entry stored first, so probing is deterministic.
    fn probe(&self, position: &mut Position) -> Option<BookEntry> {
        self.entries(position)
            .into_iter()
            .rev()
            .max_by_key(|entry| entry.weight)
    }
}

/// Result of an endgame tablebase lookup, from the side-to-move's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TbOutcome {
    Win,
    Loss,
    Draw,
}

/// A perfect-play answer from an endgame tablebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TbHit {
    /// The best move in the position.
    pub mv: Move,

    pub outcome: TbOutcome,

    /// Plies until the game is decided with perfect play.
    pub plies: i32,
}

impl TbHit {
    /// The score of this hit for a node `ply` plies from the root.
    ///
    /// Wins and losses are mate scores, so a quicker win is always preferred.
    #[inline(always)]
    pub fn score(&self, ply: i32) -> Score {
        match self.outcome {
            TbOutcome::Win => Score::mate_in(ply + self.plies),
            TbOutcome::Loss => Score::mated_in(ply + self.plies),
            TbOutcome::Draw => Score::DRAW,
        }
    }
}

/// An endgame tablebase, consulted at every node of the main search.
///
/// Probing must be cheap to reject: positions the tablebase does not cover return `None`.
pub trait TablebaseProbe: Send {
    fn probe(&self, position: &mut Position) -> Option<TbHit>;
}

/// An opening book held in memory, keyed by [`ZobristKey`].
///
/// Records use the Polyglot layout (16 big-endian bytes each, sorted by key), but the keys are this
/// crate's own Zobrist keys rather than Polyglot's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningBook {
    /// `(key, raw move, weight, games, score)`, sorted by key.
    records: Vec<(u64, u16, u16, u16, u16)>,
}

impl OpeningBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a book from a file of 16-byte records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("failed to read book {}", path.display()))?;
        Self::from_bytes(&bytes)
    }

    /// Parses a book from raw 16-byte records.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % RECORD_SIZE != 0 {
            bail!(
                "book length {} is not a multiple of {RECORD_SIZE} bytes",
                bytes.len()
            );
        }

        let mut records = bytes
            .chunks_exact(RECORD_SIZE)
            .map(|record| {
                let u16_at = |i: usize| u16::from_be_bytes([record[i], record[i + 1]]);
                let mut key = [0; 8];
                key.copy_from_slice(&record[..8]);

                (
                    u64::from_be_bytes(key),
                    u16_at(8),
                    u16_at(10),
                    u16_at(12),
                    u16_at(14),
                )
            })
            .collect::<Vec<_>>();

        // Stable, so entries of one position keep their file order
        records.sort_by_key(|record| record.0);

        Ok(Self { records })
    }

    /// Serializes this book into 16-byte records.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.records.len() * RECORD_SIZE);
        for &(key, mv, weight, games, score) in &self.records {
            bytes.extend_from_slice(&key.to_be_bytes());
            for field in [mv, weight, games, score] {
                bytes.extend_from_slice(&field.to_be_bytes());
            }
        }
        bytes
    }

    /// Adds `entry` as a candidate for the position with `key`.
    pub fn insert(&mut self, key: ZobristKey, entry: BookEntry) {
        let record = (
            key.inner(),
            to_polyglot(entry.mv),
            entry.weight,
            entry.games,
            entry.score,
        );

        let at = self.records.partition_point(|r| r.0 <= key.inner());
        self.records.insert(at, record);
    }

    /// Number of records in the book.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl BookProbe for OpeningBook {
    fn entries(&self, position: &mut Position) -> Vec<BookEntry> {
        let key = position.key().inner();
        let start = self.records.partition_point(|r| r.0 < key);

        self.records[start..]
            .iter()
            .take_while(|r| r.0 == key)
            .filter_map(|&(_, raw, weight, games, score)| {
                // Entries that don't decode to a legal move are skipped, not trusted
                let mv = from_polyglot(position, raw).ok()?;
                is_legal(position, mv).then_some(BookEntry {
                    mv,
                    weight,
                    games,
                    score,
                })
            })
            .collect()
    }
}
