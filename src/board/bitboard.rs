/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not, str::FromStr};

use anyhow::{anyhow, bail};

use super::{Color, File, Rank, Square};

/// A set of squares, stored as the bits of a `u64`.
///
/// The mapping is [Little-Endian Rank-File](https://www.chessprogramming.org/Square_Mapping_Considerations#Little-Endian_Rank-File_Mapping):
/// bit `0` is A1, bit `7` is H1 and bit `63` is H8.
/// A bitboard of the first rank therefore looks like this:
/// ```text
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 11111111
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const FILE_A: Self = Self(0x0101010101010101);
    pub const FILE_H: Self = Self(0x8080808080808080);
    pub const NOT_FILE_A: Self = Self(0xfefefefefefefefe);
    pub const NOT_FILE_H: Self = Self(0x7f7f7f7f7f7f7f7f);
    pub const RANK_1: Self = Self(0x00000000000000FF);
    pub const RANK_2: Self = Self(0x000000000000FF00);
    pub const RANK_4: Self = Self(0x00000000FF000000);
    pub const RANK_5: Self = Self(0x000000FF00000000);
    pub const RANK_7: Self = Self(0x00FF000000000000);
    pub const RANK_8: Self = Self(0xFF00000000000000);
    pub const LIGHT_SQUARES: Self = Self(0x55AA55AA55AA55AA);
    pub const DARK_SQUARES: Self = Self(0xAA55AA55AA55AA55);
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self(u64::MAX);

    /// Constructs a new [`Bitboard`] from a raw bit pattern.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Bitboard;
    /// let board = Bitboard::new(255);
    /// assert_eq!(board, Bitboard::RANK_1);
    /// ```
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Constructs a [`Bitboard`] with only `square` set.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.0)
    }

    /// Constructs a [`Bitboard`] with every square of `file` set.
    #[inline(always)]
    pub const fn from_file(file: File) -> Self {
        Self(Self::FILE_A.0 << file.0)
    }

    /// Constructs a [`Bitboard`] with every square of `rank` set.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Bitboard, Rank};
    /// assert_eq!(Bitboard::from_rank(Rank::EIGHT), Bitboard::RANK_8);
    /// ```
    #[inline(always)]
    pub const fn from_rank(rank: Rank) -> Self {
        Self(Self::RANK_1.0 << (rank.0 * 8))
    }

    /// The rank on which `color`'s pawns promote.
    #[inline(always)]
    pub const fn promotion_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_8,
            Color::Black => Self::RANK_1,
        }
    }

    /// The rank a pawn of `color` lands on after a double push.
    #[inline(always)]
    pub const fn double_push_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_4,
            Color::Black => Self::RANK_5,
        }
    }

    /// Returns the inner `u64`.
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Returns `true` if no bits are set.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if at least one bit is set.
    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if `self` and `other` share at least one set bit.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Bitboard, Square};
    /// assert!(Bitboard::RANK_1.intersects(Square::C1));
    /// assert!(!Bitboard::RANK_1.intersects(Square::C2));
    /// ```
    #[inline(always)]
    pub fn intersects(&self, other: impl Into<Self>) -> bool {
        (self.0 & other.into().0) != 0
    }

    /// Returns `true` if more than one bit is set.
    #[inline(always)]
    pub const fn has_many(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// Sets the bit(s) in `other`.
    #[inline(always)]
    pub fn set(&mut self, other: impl Into<Self>) {
        self.0 |= other.into().0
    }

    /// Clears the bit(s) in `other`.
    #[inline(always)]
    pub fn clear(&mut self, other: impl Into<Self>) {
        self.0 &= !other.into().0
    }

    /// Toggles the bit(s) in `other`.
    #[inline(always)]
    pub fn toggle(&mut self, other: impl Into<Self>) {
        self.0 ^= other.into().0
    }

    /// The lowest set square, if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(Square(self.0.trailing_zeros() as u8))
        }
    }

    /// The highest set square, if any.
    #[inline(always)]
    pub const fn msb(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(Square(63 - self.0.leading_zeros() as u8))
        }
    }

    /// Converts this [`Bitboard`] into the [`Square`] of its lowest bit.
    ///
    /// Returns `None` unless exactly one bit is set.
    #[inline(always)]
    pub const fn to_square(&self) -> Option<Square> {
        if self.0.count_ones() == 1 {
            self.lsb()
        } else {
            None
        }
    }

    /// Removes and returns the lowest set square.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let lsb = self.lsb();
        self.0 &= self.0.wrapping_sub(1);
        lsb
    }

    /// Number of set bits.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Bitboard;
    /// assert_eq!(Bitboard::RANK_8.population(), 8);
    /// ```
    #[inline(always)]
    pub const fn population(&self) -> u8 {
        self.0.count_ones() as u8
    }

    /// Iterate over all set squares, lowest first.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }

    /// Shifts every square one rank "forward" from `color`'s point of view.
    ///
    /// Squares pushed off the board are discarded.
    #[inline(always)]
    pub const fn forward(self, color: Color) -> Self {
        match color {
            Color::White => Self(self.0 << 8),
            Color::Black => Self(self.0 >> 8),
        }
    }

    /// Shifts every square one rank "backward" from `color`'s point of view.
    #[inline(always)]
    pub const fn backward(self, color: Color) -> Self {
        self.forward(color.opponent())
    }

    #[inline(always)]
    pub const fn east(self) -> Self {
        Self((self.0 << 1) & Self::NOT_FILE_A.0)
    }

    #[inline(always)]
    pub const fn west(self) -> Self {
        Self((self.0 >> 1) & Self::NOT_FILE_H.0)
    }

    /// Formats this board as `0x`-prefixed, zero-padded hexadecimal.
    pub fn to_hex_string(&self) -> String {
        format!("0x{:0>16X}", self.0)
    }
}

impl FromStr for Bitboard {
    type Err = anyhow::Error;

    /// Parses a hexadecimal (`0x...`) or binary (`0b...`) bit pattern.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = if let Some(hex) = s.strip_prefix("0x") {
            u64::from_str_radix(hex, 16)
        } else if let Some(bin) = s.strip_prefix("0b") {
            u64::from_str_radix(bin, 2)
        } else {
            bail!("Bitboard strings must begin with `0x` or `0b`. Got {s:?}");
        };

        bits.map(Self).map_err(|e| anyhow!("Invalid Bitboard {s:?}: {e}"))
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), |bb, sq| bb | sq)
    }
}

macro_rules! impl_bitwise_op {
    ($op:tt, $op_assign:tt, $func:ident, $func_assign:ident) => {
        impl<T> std::ops::$op<T> for Bitboard
        where
            Self: From<T>,
        {
            type Output = Self;
            #[inline(always)]
            fn $func(self, rhs: T) -> Self::Output {
                Self(self.0.$func(Self::from(rhs).0))
            }
        }

        impl<T> std::ops::$op_assign<T> for Bitboard
        where
            Self: From<T>,
        {
            #[inline(always)]
            fn $func_assign(&mut self, rhs: T) {
                self.0.$func_assign(Self::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, BitAndAssign, bitand, bitand_assign);
impl_bitwise_op!(BitOr, BitOrAssign, bitor, bitor_assign);
impl_bitwise_op!(BitXor, BitXorAssign, bitxor, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl From<File> for Bitboard {
    #[inline(always)]
    fn from(value: File) -> Self {
        Self::from_file(value)
    }
}

impl From<Rank> for Bitboard {
    #[inline(always)]
    fn from(value: Rank) -> Self {
        Self::from_rank(value)
    }
}

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let occupant = if self.intersects(Square::new(file, rank)) {
                    'X'
                } else {
                    '.'
                };
                write!(f, "{occupant} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;
            for file in File::iter() {
                let occupant = if self.intersects(Square::new(file, rank)) {
                    'X'
                } else {
                    '.'
                };
                write!(f, "{occupant} ")?;
            }
            writeln!(f)?;
        }
        write!(f, " +----------------\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }
        Ok(())
    }
}

/// An iterator over the set squares of a [`Bitboard`], from A1 towards H8.
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bitboard.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_msb() {
        let board = Bitboard::from_square(Square::C3) | Square::F6;
        assert_eq!(board.lsb(), Some(Square::C3));
        assert_eq!(board.msb(), Some(Square::F6));
        assert_eq!(Bitboard::EMPTY_BOARD.lsb(), None);
        assert_eq!(Bitboard::EMPTY_BOARD.msb(), None);
    }

    #[test]
    fn test_shifts_do_not_wrap() {
        assert_eq!(Bitboard::FILE_H.east(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.west(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_8.forward(Color::White), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_1.forward(Color::Black), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_7.forward(Color::White), Bitboard::RANK_8);
    }

    #[test]
    fn test_iter_and_collect() {
        let squares = [Square::A1, Square::D4, Square::H8];
        let board: Bitboard = squares.into_iter().collect();
        assert_eq!(board.population(), 3);
        assert!(board.has_many());
        assert_eq!(board.iter().collect::<Vec<_>>(), squares);
        assert_eq!(board.iter().len(), 3);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("0xFF".parse::<Bitboard>().unwrap(), Bitboard::RANK_1);
        assert_eq!("0b11111111".parse::<Bitboard>().unwrap(), Bitboard::RANK_1);
        assert!("FF".parse::<Bitboard>().is_err());
    }
}
