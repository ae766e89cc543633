//! Automaton instance: the public surface over a single evolving row.

use serde::{Deserialize, Serialize};

use super::{AutomatonError, Row, Rule, Stepper, StepperKind, Word, grown_length, word_cost};

/// A row plus the generations applied to it so far.
///
/// `next` is the only mutator. It either commits every requested generation
/// or fails before touching the row.
#[derive(Debug, Clone)]
pub struct Automaton<W: Word = u64> {
    row: Row<W>,
    stepper: StepperKind,
    generation: u64,
}

impl<W: Word> Automaton<W> {
    /// Construct from ordered words and an explicit bit length.
    pub fn new(words: Vec<W>, length: usize) -> Result<Self, AutomatonError> {
        Ok(Self::from_row(Row::new(words, length)?))
    }

    pub fn from_row(row: Row<W>) -> Self {
        Self {
            row,
            stepper: StepperKind::default(),
            generation: 0,
        }
    }

    /// Select the stepper used by subsequent generations.
    pub fn with_stepper(mut self, stepper: StepperKind) -> Self {
        self.stepper = stepper;
        self
    }

    /// Apply `rule` for `generations` generations.
    ///
    /// Fails with [`AutomatonError::InvalidRule`] outside 0-255 before any
    /// generation is applied.
    pub fn next(&mut self, rule: i64, generations: u64) -> Result<(), AutomatonError> {
        let rule = Rule::try_from(rule)?;
        self.advance(rule, generations)
    }

    /// Typed form of [`Automaton::next`].
    pub fn advance(&mut self, rule: Rule, generations: u64) -> Result<(), AutomatonError> {
        self.advance_with(rule, generations, |_, _| {})
    }

    /// Like [`Automaton::advance`], calling `on_generation` with the absolute
    /// generation number after each generation is committed.
    pub fn advance_with<F: FnMut(u64, &Row<W>)>(
        &mut self,
        rule: Rule,
        generations: u64,
        mut on_generation: F,
    ) -> Result<(), AutomatonError> {
        let overflow = AutomatonError::LengthOverflow {
            length: self.row.len(),
            generations,
        };
        let target = self.generation.checked_add(generations).ok_or(overflow)?;
        let base = self.generation;

        self.stepper
            .advance_in_place(&mut self.row, rule, generations, |offset, row| {
                on_generation(base + offset, row)
            })?;
        self.generation = target;

        log::debug!(
            "applied {} for {} generations: generation {}, length {}",
            rule,
            generations,
            self.generation,
            self.row.len()
        );
        Ok(())
    }

    /// Raw word `word_index` of the current generation.
    pub fn bitmap(&self, word_index: usize) -> Result<W, AutomatonError> {
        self.row.get_word(word_index)
    }

    /// Bit length of the current generation.
    pub fn generation_size(&self) -> usize {
        self.row.len()
    }

    pub fn get_bit(&self, index: usize) -> Result<bool, AutomatonError> {
        self.row.get_bit(index)
    }

    /// Generations applied since construction.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn row(&self) -> &Row<W> {
        &self.row
    }

    pub fn into_row(self) -> Row<W> {
        self.row
    }

    pub fn stepper(&self) -> StepperKind {
        self.stepper
    }

    /// Word updates the next `generations` generations will cost.
    pub fn cost(&self, generations: u64) -> Result<u64, AutomatonError> {
        grown_length(self.row.len(), generations)?;
        word_cost::<W>(self.row.len(), generations).ok_or(AutomatonError::LengthOverflow {
            length: self.row.len(),
            generations,
        })
    }

    /// Current generation as `'0'`/`'1'` characters.
    pub fn print(&self) -> String {
        self.row.to_bit_string()
    }

    pub fn stats(&self) -> AutomatonStats {
        AutomatonStats::from_automaton(self)
    }
}

/// Summary of the current generation for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomatonStats {
    pub generation: u64,
    pub length: usize,
    pub words: usize,
    pub population: usize,
    pub density: f64,
}

impl AutomatonStats {
    pub fn from_automaton<W: Word>(automaton: &Automaton<W>) -> Self {
        let row = automaton.row();
        let population = row.population();
        Self {
            generation: automaton.generation(),
            length: row.len(),
            words: row.word_count(),
            population,
            density: if row.is_empty() {
                0.0
            } else {
                population as f64 / row.len() as f64
            },
        }
    }
}
