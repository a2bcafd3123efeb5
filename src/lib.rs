/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Bitboards, positions, and move generation.
mod board;

/// Command-line interface of the developer binary.
mod cli;

/// Runs searches on a worker thread.
mod engine;

/// Error types.
mod error;

/// Evaluation of chess positions.
mod eval;

/// History heuristic and killer moves.
mod history;

/// Lazy, score-ordered move selection.
mod movepicker;

/// Textual move formats.
mod notation;

/// Opening book and endgame tablebase interfaces.
mod probe;

/// Piece-Square tables.
mod psqt;

/// Centipawn and mate scores.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Game-over detection.
mod status;

/// Search parameters.
mod tune;

/// Transposition table.
mod ttable;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use error::*;
pub use eval::*;
pub use history::*;
pub use movepicker::*;
pub use notation::*;
pub use probe::*;
pub use psqt::*;
pub use score::*;
pub use search::*;
pub use status::*;
pub use ttable::*;
