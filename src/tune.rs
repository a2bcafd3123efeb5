/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Divisor for computing the soft timeout of a search.
macro_rules! soft_timeout_divisor {
    () => {
        20
    };
}
pub(crate) use soft_timeout_divisor;

/// Divisor for computing the hard timeout of a search.
macro_rules! hard_timeout_divisor {
    () => {
        5
    };
}
pub(crate) use hard_timeout_divisor;

/// Divisor for computing how much of the time increment to use.
macro_rules! time_inc_divisor {
    () => {
        2
    };
}
pub(crate) use time_inc_divisor;

/// Number of nodes between two checks of the clock and the stop flag.
macro_rules! timecheck_interval {
    () => {
        1024
    };
}
pub(crate) use timecheck_interval;

/// Largest magnitude a history score may reach.
macro_rules! max_history_bonus {
    () => {
        16_384
    };
}
pub(crate) use max_history_bonus;

/// Value to multiply depth by when computing history bonuses.
macro_rules! history_multiplier {
    () => {
        300
    };
}
pub(crate) use history_multiplier;

/// Value to subtract from a history bonus at a given depth.
macro_rules! history_offset {
    () => {
        250
    };
}
pub(crate) use history_offset;

/// Ordering bonus for the first killer slot of a depth. The second slot gets slightly less.
macro_rules! killer_bonus {
    () => {
        20_000
    };
}
pub(crate) use killer_bonus;
