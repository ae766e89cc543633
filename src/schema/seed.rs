//! Seed types for initializing elementary automata.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::compute::{AutomatonError, Row, Word};

/// Complete seed specification for the initial row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    /// Pattern to use for seeding.
    pub pattern: Pattern,
}

/// Initial row patterns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// The single live cell "1".
    #[default]
    SingleCell,
    /// Cells given as a left-to-right string of '0' and '1'.
    Bits {
        bits: String,
    },
    /// Raw 64-bit words, most significant bit first, plus the bit length.
    Words {
        words: Vec<u64>,
        length: usize,
    },
    /// Uniform random cells.
    Random {
        /// Number of cells.
        length: usize,
        /// Probability that a cell is alive (0.0-1.0).
        density: f64,
        /// Random seed.
        seed: u64,
    },
}

impl Seed {
    pub fn bits(bits: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::Bits { bits: bits.into() },
        }
    }

    /// Generate the initial row.
    pub fn generate<W: Word>(&self) -> Result<Row<W>, AutomatonError> {
        match &self.pattern {
            Pattern::SingleCell => Ok(Row::single_cell()),
            Pattern::Bits { bits } => Row::from_bit_str(bits),
            Pattern::Words { words, length } => {
                // Regroup into the target width.
                let source = Row::<u64>::new(words.clone(), *length)?;
                Ok(Row::from_bits(source.iter()))
            }
            Pattern::Random {
                length,
                density,
                seed,
            } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                let p = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
                Ok(Row::from_bits((0..*length).map(|_| rng.gen_bool(p))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_cell() {
        let row: Row<u64> = Seed::default().generate().unwrap();
        assert_eq!(row.to_bit_string(), "1");
    }

    #[test]
    fn test_bits_pattern() {
        let row: Row<u8> = Seed::bits("0110100111").generate().unwrap();
        assert_eq!(row.len(), 10);
        assert_eq!(row.words(), &[0b0110_1001, 0b1100_0000]);
        assert!(Seed::bits("01a").generate::<u8>().is_err());
    }

    #[test]
    fn test_words_pattern_regroups() {
        let seed = Seed {
            pattern: Pattern::Words {
                words: vec![0xF000_0000_0000_0001, 0x8000_0000_0000_0000],
                length: 65,
            },
        };
        let row: Row<u16> = seed.generate().unwrap();
        assert_eq!(row.len(), 65);
        assert_eq!(row.word_count(), 5);
        assert_eq!(row.words()[0], 0xF000);
        assert_eq!(row.words()[3], 0x0001);
        assert_eq!(row.words()[4], 0x8000);

        let bad = Seed {
            pattern: Pattern::Words {
                words: vec![0],
                length: 65,
            },
        };
        assert_eq!(
            bad.generate::<u64>(),
            Err(AutomatonError::InvalidConstruction {
                length: 65,
                capacity: 64
            })
        );
    }

    #[test]
    fn test_random_is_deterministic() {
        let seed = Seed {
            pattern: Pattern::Random {
                length: 500,
                density: 0.3,
                seed: 42,
            },
        };
        let a: Row<u64> = seed.generate().unwrap();
        let b: Row<u64> = seed.generate().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
        let density = a.population() as f64 / 500.0;
        assert!(density > 0.2 && density < 0.4, "density {}", density);
    }

    #[test]
    fn test_serialization() {
        let seed = Seed::bits("101");
        let json = serde_json::to_string(&seed).unwrap();
        assert_eq!(json, r#"{"pattern":{"type":"Bits","bits":"101"}}"#);
        let parsed: Seed = serde_json::from_str(r#"{"pattern":{"type":"SingleCell"}}"#).unwrap();
        assert!(matches!(parsed.pattern, Pattern::SingleCell));
    }
}
