/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Move, Score, SearchBounds, ZobristKey};

/// Number of bytes in a megabyte
const BYTES_IN_MB: usize = 1024 * 1024;

/// What the score of a [`TTableEntry`] says about the true score of its position.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Bound {
    /// The score is exact (a PV node).
    Exact,

    /// The score failed low, so the true score is at most this (an All node).
    Upper,

    /// The score failed high, so the true score is at least this (a Cut node).
    Lower,
}

impl Bound {
    /// Creates a new [`Bound`] based on the parameters as follows:
    ///
    /// ```text
    /// if score <= alpha:
    ///     UPPERBOUND
    /// else if score >= beta:
    ///     LOWERBOUND
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::Upper
        } else if score >= bounds.beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }
}

/// An entry into a hash table
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TTableEntry {
    /// Key of the node this entry represents.
    pub key: ZobristKey,

    /// Depth at which the data for this entry was found.
    pub depth: u8,

    /// Best move found for this position, if any.
    pub bestmove: Option<Move>,

    /// Best score found for this position, stored independent of ply.
    pub score: Score,

    /// Bound kind of this entry.
    pub bound: Bound,

    /// Search generation in which this entry was written.
    pub generation: u8,
}

impl TTableEntry {
    /// Creates a new [`TTableEntry`] from the provided parameters.
    ///
    /// This will generate a bound through [`Bound::new`] and
    /// will adjust `score` by `ply` if it was a mate score.
    ///
    /// The generation is filled in by [`TTable::store`].
    #[inline(always)]
    pub fn new(
        key: ZobristKey,
        bestmove: Option<Move>,
        score: Score,
        bounds: SearchBounds,
        depth: u8,
        ply: i32,
    ) -> Self {
        // Determine the bound first, before score adjustment
        let bound = Bound::new(score, bounds);

        // Adjust the score (if it was mate) to the node at which we found it
        let score = score.absolute(ply);

        Self {
            key,
            bestmove,
            score,
            depth,
            bound,
            generation: 0,
        }
    }

    /// The stored score, made relative to `ply` again.
    #[inline(always)]
    pub fn score_at(&self, ply: i32) -> Score {
        self.score.relative(ply)
    }

    /// Determine whether the score in this entry can be used and, if so, return it.
    ///
    /// An entry's score can be used if and only if:
    ///     1. The entry is exact ([`Bound::Exact`]).
    ///     2. The entry is an upper bound ([`Bound::Upper`]) and its score is `<= alpha`.
    ///     3. The entry is a lower bound ([`Bound::Lower`]) and its score is `>= beta`.
    #[inline(always)]
    pub fn try_score(&self, bounds: SearchBounds, ply: i32) -> Option<Score> {
        let score = self.score_at(ply);

        (self.bound == Bound::Exact
            || (self.bound == Bound::Upper && score <= bounds.alpha)
            || (self.bound == Bound::Lower && score >= bounds.beta))
            .then_some(score)
    }
}

/// Transposition Table.
///
/// Used during a search to keep track of previous search results on positions,
/// avoiding unnecessary re-computations.
///
/// The table never grows. Each key maps to exactly one slot, and a colliding store silently
/// replaces the occupant when it is stale, shallower, or for a different position.
#[derive(Debug)]
pub struct TTable {
    /// Internal cache of the TTable.
    cache: Vec<Option<TTableEntry>>,

    /// Current search generation.
    generation: u8,

    /// Number of collisions that have occurred since last clearing.
    pub(crate) collisions: usize,

    /// Number of accesses that have occurred since last clearing.
    pub(crate) accesses: usize,

    /// Number of hits that have occurred since last clearing.
    pub(crate) hits: usize,
}

impl TTable {
    /// Default size of the Transposition Table, in megabytes.
    pub const DEFAULT_SIZE: usize = 16;

    /// Minimum size of the Transposition Table, in megabytes.
    pub const MIN_SIZE: usize = 1;

    /// Maximum size of the Transposition Table, in megabytes.
    pub const MAX_SIZE: usize = 1_024;

    /// Create a new [`TTable`] that is at most `size` megabytes.
    ///
    /// `size` is clamped to `[MIN_SIZE, MAX_SIZE]`.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        let size = size.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
        Self::from_capacity((size * BYTES_IN_MB) / size_of::<Option<TTableEntry>>())
    }

    /// Create a new [`TTable`] that can hold `capacity` entries.
    ///
    /// The capacity is rounded down to a power of two (and is at least 1), so that keys can be masked into indices.
    #[inline(always)]
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = match capacity {
            0 => 1,
            n if n.is_power_of_two() => n,
            n => n.next_power_of_two() >> 1,
        };

        Self {
            cache: vec![None; capacity],
            generation: 0,
            collisions: 0,
            accesses: 0,
            hits: 0,
        }
    }

    /// Clears the entries of this [`TTable`].
    #[inline(always)]
    pub fn clear(&mut self) {
        self.cache.iter_mut().for_each(|entry| *entry = None);
        self.generation = 0;
        self.collisions = 0;
        self.accesses = 0;
        self.hits = 0;
    }

    /// Marks the start of a new search, so that entries from earlier searches become replaceable.
    #[inline(always)]
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// The current search generation.
    #[inline(always)]
    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Returns the number of entries that can fit within this [`TTable`]
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    /// Returns the size of this [`TTable`], in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.cache.len() * size_of::<Option<TTableEntry>>() / BYTES_IN_MB
    }

    /// Returns the number of `Some` entries in this [`TTable`].
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache.iter().filter(|entry| entry.is_some()).count()
    }

    /// Number of probes since the table was last cleared.
    #[inline(always)]
    pub fn accesses(&self) -> usize {
        self.accesses
    }

    /// Number of probes that found a matching entry since the table was last cleared.
    #[inline(always)]
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of stores that evicted a different position since the table was last cleared.
    #[inline(always)]
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Map `key` to an index into this [`TTable`].
    #[inline(always)]
    pub fn index(&self, key: &ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Get the entry if and only if it matches the provided key
    #[inline(always)]
    pub fn get(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        self.entry(key).filter(|e| &e.key == key)
    }

    /// Like [`TTable::get`], but records the access and hit counts.
    #[inline(always)]
    pub fn probe(&mut self, key: &ZobristKey) -> Option<TTableEntry> {
        self.accesses += 1;
        let found = self.get(key).cloned();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    /// Get the entry, without regards for whether it matches the provided key
    #[inline(always)]
    fn entry(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        // Indexing is safe as the capacity is always at least 1
        self.cache[self.index(key)].as_ref()
    }

    /// Store `entry` in the table at `entry.key`, stamping it with the current generation.
    ///
    /// The slot is overwritten if it is empty, holds a different position, holds an entry from an
    /// older search, or holds an entry searched no deeper than `entry`.
    /// Returns whatever was evicted.
    #[inline(always)]
    pub fn store(&mut self, mut entry: TTableEntry) -> Option<TTableEntry> {
        entry.generation = self.generation;
        let index = self.index(&entry.key);

        let replace = match &self.cache[index] {
            None => true,
            Some(old) => {
                old.key != entry.key
                    || old.generation != self.generation
                    || entry.depth >= old.depth
            }
        };

        if !replace {
            return None;
        }

        if matches!(&self.cache[index], Some(old) if old.key != entry.key) {
            self.collisions += 1;
        }

        self.cache[index].replace(entry)
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
