//! Generation steppers.
//!
//! A generation maps a row of length `n` to a row of length `n + 2`: new
//! cell `j` is the rule applied to old cells `(j - 2, j - 1, j)`, with every
//! old cell outside `[0, n)` dead. New cells `0` and `n + 1` are the two
//! boundary cells born this generation.

use serde::{Deserialize, Serialize};

use super::word::{tail_mask, words_for};
use super::{AutomatonError, Row, Rule, Word};

/// Computes successive generations of a row.
pub trait Stepper {
    /// Write the words of the next generation of `row` into `next`.
    ///
    /// `next` is cleared first; on return it holds exactly
    /// `words_for(row.len() + 2)` words with the unused tail bits zeroed.
    fn step_into<W: Word>(&self, row: &Row<W>, rule: Rule, next: &mut Vec<W>);

    /// Next generation of `row`.
    fn step<W: Word>(&self, row: &Row<W>, rule: Rule) -> Row<W> {
        let mut next = Vec::with_capacity(words_for::<W>(row.len() + 2));
        self.step_into(row, rule, &mut next);
        let mut stepped = Row::empty();
        stepped.replace(&mut next, row.len() + 2);
        stepped
    }

    /// Row after `generations` generations. `row` itself is left untouched.
    fn step_n<W: Word>(
        &self,
        row: &Row<W>,
        rule: Rule,
        generations: u64,
    ) -> Result<Row<W>, AutomatonError> {
        let mut current = row.clone();
        self.advance_in_place(&mut current, rule, generations, |_, _| {})?;
        Ok(current)
    }

    /// Advance `row` in place, calling `on_generation` with the generation
    /// offset (1-based) after each one is committed.
    ///
    /// The final length is checked before the first generation: on error the
    /// row is unchanged.
    fn advance_in_place<W: Word, F: FnMut(u64, &Row<W>)>(
        &self,
        row: &mut Row<W>,
        rule: Rule,
        generations: u64,
        mut on_generation: F,
    ) -> Result<(), AutomatonError> {
        grown_length(row.len(), generations)?;
        // Grown one generation at a time by `step_into`.
        let mut next = Vec::new();
        for generation in 1..=generations {
            self.step_into(row, rule, &mut next);
            let length = row.len() + 2;
            row.replace(&mut next, length);
            log::trace!("{} generation {}: length {}", rule, generation, length);
            on_generation(generation, row);
        }
        Ok(())
    }
}

/// Length of a row after `generations` generations.
pub fn grown_length(length: usize, generations: u64) -> Result<usize, AutomatonError> {
    usize::try_from(generations)
        .ok()
        .and_then(|g| g.checked_mul(2))
        .and_then(|growth| length.checked_add(growth))
        .ok_or(AutomatonError::LengthOverflow {
            length,
            generations,
        })
}

/// Exact number of word updates [`WordStepper`] performs advancing a row of
/// `length` cells by `generations`. `None` on overflow.
///
/// Generation `g` costs `ceil((length + 2g) / W)` words. Every `W / 2`
/// generations that count rises by exactly one, so the sum is evaluated per
/// offset within such a block instead of per generation.
pub fn word_cost<W: Word>(length: usize, generations: u64) -> Option<u64> {
    grown_length(length, generations).ok()?;

    let width = u128::from(W::BITS);
    let block = width / 2;
    let generations = u128::from(generations);
    let (full, rem) = (generations / block, generations % block);

    // Words of generation `t * block + s + 1` are `t + base(s)`.
    let base = |s: u128| (length as u128 + 2 * (s + 1) + width - 1) / width;
    let mut total = (0..block.min(generations)).try_fold(0u128, |acc, s| {
        let count = full + u128::from(s < rem);
        acc.checked_add(count.checked_mul(base(s))?)
    })?;

    // Block `t` adds `t` per generation: `block * (0 + .. + full - 1)` over
    // the full blocks, `full * rem` for the partial one.
    let triangle = full.checked_mul(full.saturating_sub(1))? / 2;
    total = total
        .checked_add(block.checked_mul(triangle)?)?
        .checked_add(rem.checked_mul(full)?)?;

    u64::try_from(total).ok()
}

/// Reference stepper: one cell at a time, straight from the definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveStepper;

impl Stepper for NaiveStepper {
    fn step_into<W: Word>(&self, row: &Row<W>, rule: Rule, next: &mut Vec<W>) {
        let length = row.len() as isize;
        let cells = (0..length + 2).map(|j| rule.apply(row.cell(j - 2), row.cell(j - 1), row.cell(j)));
        let (words, _) = Row::<W>::from_bits(cells).into_parts();
        next.clear();
        next.extend(words);
    }
}

/// Word-batched stepper.
///
/// For output word `k` the right neighbors are exactly old word `k`; the
/// centers and lefts are the old stream shifted by one and two cells, with
/// the low bits of old word `k - 1` stitched into the top of the word. Words
/// before the row and past its end read as zero, which yields the dead
/// boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordStepper;

impl Stepper for WordStepper {
    fn step_into<W: Word>(&self, row: &Row<W>, rule: Rule, next: &mut Vec<W>) {
        let length = row.len() + 2;
        let count = words_for::<W>(length);
        next.clear();
        next.reserve(count);

        let mut prev = W::ZERO;
        let mut cur = row.masked_word(0);
        for k in 0..count {
            let right = cur;
            let center = (cur >> 1) | (prev << (W::BITS - 1));
            let left = (cur >> 2) | (prev << (W::BITS - 2));
            next.push(rule.apply_word(left, center, right));
            prev = cur;
            cur = row.masked_word(k + 1);
        }

        if let Some(last) = next.last_mut() {
            *last = *last & tail_mask(length);
        }
    }
}

/// Stepper selection for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepperKind {
    #[default]
    Word,
    Naive,
}

impl Stepper for StepperKind {
    fn step_into<W: Word>(&self, row: &Row<W>, rule: Rule, next: &mut Vec<W>) {
        match self {
            StepperKind::Word => WordStepper.step_into(row, rule, next),
            StepperKind::Naive => NaiveStepper.step_into(row, rule, next),
        }
    }
}
