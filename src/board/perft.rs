/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{generate_legal, Move, Position};

/// Count the leaf nodes of the legal move tree, `depth` plies deep.
///
/// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves,
/// rather than making them, recursing again, and returning 1 for each terminal case.
///
/// # Example
/// ```
/// # use tadpole::*;
/// let mut pos = Position::default();
/// assert_eq!(perft(&mut pos, 3), 8902);
/// ```
pub fn perft(position: &mut Position, depth: usize) -> u64 {
    // Recursion limit; return 1, since we're fathoming this node.
    if depth == 0 {
        return 1;
    }

    let moves = generate_legal(position);

    // Bulk counting; no need to recurse again just to apply a singular move and return 1.
    if depth == 1 {
        return moves.len() as u64;
    }

    moves.into_iter().fold(0, |nodes, mv| {
        position.make_move(mv);
        let new_nodes = perft(position, depth - 1);
        position.unmake_move();
        nodes + new_nodes
    })
}

/// Perform a perft at the specified depth, returning the number of leaf nodes reachable after each root move.
pub fn splitperft(position: &mut Position, depth: usize) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    generate_legal(position)
        .into_iter()
        .map(|mv| {
            position.make_move(mv);
            let nodes = perft(position, depth - 1);
            position.unmake_move();
            (mv, nodes)
        })
        .collect()
}
