//! Word-packed row of cells (one generation).

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::word::{bit_mask, tail_mask, words_for};
use super::{AutomatonError, Word};

/// The current generation: `length` cells packed into words.
///
/// Cell `i` lives in word `i / W::BITS` at offset `i % W::BITS` counted from
/// the most significant bit. Bits past `length` in the final word are not
/// part of the row; rows produced by a stepper keep them at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RowParts<W>", bound(deserialize = "W: Word"))]
pub struct Row<W: Word = u64> {
    words: Vec<W>,
    length: usize,
}

/// Unvalidated `(words, length)` snapshot.
#[derive(Deserialize)]
#[serde(bound(deserialize = "W: Word"))]
struct RowParts<W: Word> {
    words: Vec<W>,
    length: usize,
}

impl<W: Word> TryFrom<RowParts<W>> for Row<W> {
    type Error = AutomatonError;

    fn try_from(parts: RowParts<W>) -> Result<Self, Self::Error> {
        Row::new(parts.words, parts.length)
    }
}

impl<W: Word> Row<W> {
    /// Build a row from ordered words and an explicit bit length.
    ///
    /// Trailing words past the last populated cell are dropped. The unused
    /// low bits of the final word are taken as given.
    pub fn new(mut words: Vec<W>, length: usize) -> Result<Self, AutomatonError> {
        let capacity = words.len().saturating_mul(W::BITS as usize);
        if length > capacity {
            return Err(AutomatonError::InvalidConstruction { length, capacity });
        }
        words.truncate(words_for::<W>(length));
        Ok(Self { words, length })
    }

    /// Row with no cells.
    pub fn empty() -> Self {
        Self {
            words: Vec::new(),
            length: 0,
        }
    }

    /// The single live cell "1".
    pub fn single_cell() -> Self {
        Self {
            words: vec![bit_mask(0)],
            length: 1,
        }
    }

    /// Pack cells given left to right.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut words = Vec::new();
        let mut length = 0usize;
        let width = W::BITS as usize;
        for bit in bits {
            let offset = (length % width) as u32;
            if offset == 0 {
                words.push(W::ZERO);
            }
            if bit {
                if let Some(last) = words.last_mut() {
                    *last |= bit_mask(offset);
                }
            }
            length += 1;
        }
        Self { words, length }
    }

    /// Parse a left-to-right string of `'0'` and `'1'`.
    pub fn from_bit_str(s: &str) -> Result<Self, AutomatonError> {
        if let Some((position, found)) = s.chars().enumerate().find(|&(_, c)| c != '0' && c != '1') {
            return Err(AutomatonError::InvalidBitString { position, found });
        }
        Ok(Self::from_bits(s.chars().map(|c| c == '1')))
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn words(&self) -> &[W] {
        &self.words
    }

    /// Cell at `index`.
    pub fn get_bit(&self, index: usize) -> Result<bool, AutomatonError> {
        if index >= self.length {
            return Err(AutomatonError::OutOfRange {
                index,
                bound: self.length,
            });
        }
        Ok(self.bit_unchecked(index))
    }

    /// Raw word at `word_index`, unused low bits included.
    pub fn get_word(&self, word_index: usize) -> Result<W, AutomatonError> {
        self.words
            .get(word_index)
            .copied()
            .ok_or(AutomatonError::OutOfRange {
                index: word_index,
                bound: self.words.len(),
            })
    }

    /// Neighborhood read: cells outside the row are dead.
    #[inline]
    pub fn cell(&self, position: isize) -> bool {
        usize::try_from(position)
            .ok()
            .filter(|&i| i < self.length)
            .is_some_and(|i| self.bit_unchecked(i))
    }

    /// Word `word_index` with everything past the row cleared; zero past the
    /// last word.
    #[inline]
    pub(crate) fn masked_word(&self, word_index: usize) -> W {
        match self.words.get(word_index) {
            Some(&word) if word_index + 1 == self.words.len() => word & tail_mask(self.length),
            Some(&word) => word,
            None => W::ZERO,
        }
    }

    #[inline]
    fn bit_unchecked(&self, index: usize) -> bool {
        let width = W::BITS as usize;
        let word = self.words[index / width];
        word & bit_mask((index % width) as u32) != W::ZERO
    }

    /// Swap in a complete next generation. `next` receives the previous
    /// word buffer for reuse.
    pub(crate) fn replace(&mut self, next: &mut Vec<W>, length: usize) {
        debug_assert_eq!(next.len(), words_for::<W>(length));
        std::mem::swap(&mut self.words, next);
        self.length = length;
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        (0..self.words.len())
            .map(|k| self.masked_word(k).count_ones() as usize)
            .sum()
    }

    /// Cells left to right.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.length).map(|i| self.bit_unchecked(i))
    }

    /// Render with caller-chosen characters.
    pub fn render(&self, alive: char, dead: char) -> String {
        self.iter().map(|b| if b { alive } else { dead }).collect()
    }

    /// Left-to-right `'0'`/`'1'` string of length `len()`.
    pub fn to_bit_string(&self) -> String {
        self.render('1', '0')
    }

    pub fn into_parts(self) -> (Vec<W>, usize) {
        (self.words, self.length)
    }
}

/// Rows compare by their cells; bits past `length` are ignored.
impl<W: Word> PartialEq for Row<W> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length
            && (0..self.words.len()).all(|k| self.masked_word(k) == other.masked_word(k))
    }
}

impl<W: Word> Eq for Row<W> {}

impl<W: Word> Hash for Row<W> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for k in 0..self.words.len() {
            self.masked_word(k).hash(state);
        }
    }
}

impl<W: Word> Default for Row<W> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<W: Word> Display for Row<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

impl<W: Word> FromStr for Row<W> {
    type Err = AutomatonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bit_str(s)
    }
}
