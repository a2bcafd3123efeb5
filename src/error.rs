/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use crate::{Color, Position, ZobristKey};

/// Move text that could not be understood in the context of a position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse {token:?}: {reason} [{fen}]")]
pub struct ParseError {
    /// The offending text.
    pub token: String,
    /// Why it was rejected.
    pub reason: String,
    /// FEN of the position the text was parsed against.
    pub fen: String,
}

impl ParseError {
    pub fn new(token: impl Into<String>, reason: impl Into<String>, position: &Position) -> Self {
        Self {
            token: token.into(),
            reason: reason.into(),
            fen: position.to_fen(),
        }
    }
}

/// A well-formed move that cannot be played in a position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal move {mv}: {reason} [{fen}]")]
pub struct IllegalMoveError {
    pub mv: String,
    pub reason: String,
    pub fen: String,
}

impl IllegalMoveError {
    pub fn new(mv: impl Into<String>, reason: impl Into<String>, position: &Position) -> Self {
        Self {
            mv: mv.into(),
            reason: reason.into(),
            fen: position.to_fen(),
        }
    }
}

/// Anything that can go wrong turning text into a playable move.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Illegal(#[from] IllegalMoveError),
}

/// Corruption of a [`Position`]. These are programming errors, never user errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("cannot unmake a move: the move history is empty")]
    EmptyHistory,

    #[error("incremental hash {found} does not match recomputed hash {expected}")]
    HashMismatch {
        expected: ZobristKey,
        found: ZobristKey,
    },

    #[error("{0} has no King")]
    MissingKing(Color),

    #[error("{color} has {count} Kings")]
    ExtraKing { color: Color, count: u8 },
}

/// Why a search stopped before reaching its depth limit.
///
/// This is recorded on the search result rather than returned as an error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchInterrupted {
    #[error("search was stopped externally")]
    Stopped,

    #[error("search ran out of time")]
    Timeout,

    #[error("search reached its node limit")]
    NodeLimit,
}
