//! Fixed-width words used as the packing unit of a row.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor, Not, Shl, Shr};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Unsigned integer usable as a row word.
///
/// Bits are read most-significant-first: the leftmost cell of a word is
/// its highest bit.
pub trait Word:
    Copy
    + Eq
    + Hash
    + Default
    + Debug
    + Send
    + Sync
    + 'static
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + BitOrAssign
    + Serialize
    + DeserializeOwned
{
    /// Width in bits.
    const BITS: u32;
    /// Width in bytes when encoded.
    const BYTES: usize;
    const ZERO: Self;
    const ONE: Self;
    const MAX: Self;

    fn count_ones(self) -> u32;

    /// Append the little-endian encoding of the word.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode a word from exactly `Self::BYTES` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_word {
    ($($t:ty),*) => {
        $(
            impl Word for $t {
                const BITS: u32 = <$t>::BITS;
                const BYTES: usize = std::mem::size_of::<$t>();
                const ZERO: Self = 0;
                const ONE: Self = 1;
                const MAX: Self = <$t>::MAX;

                #[inline]
                fn count_ones(self) -> u32 {
                    <$t>::count_ones(self)
                }

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_word!(u8, u16, u32, u64, u128);

/// Minimal number of words holding `length` bits.
#[inline]
pub fn words_for<W: Word>(length: usize) -> usize {
    length.div_ceil(W::BITS as usize)
}

/// Mask keeping the populated bits of the final word of a `length`-bit row.
#[inline]
pub fn tail_mask<W: Word>(length: usize) -> W {
    let used = (length % W::BITS as usize) as u32;
    if used == 0 {
        W::MAX
    } else {
        !(W::MAX >> used)
    }
}

/// Single-bit mask for `offset` within a word (0 = leftmost).
#[inline]
pub fn bit_mask<W: Word>(offset: u32) -> W {
    W::ONE << (W::BITS - 1 - offset)
}
