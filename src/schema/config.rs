//! Configuration types for automaton runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Pattern, Seed};
use crate::compute::{AutomatonError, Rule, StepperKind};
use crate::history::CompressionType;

fn default_rule() -> u32 {
    30
}

fn default_generations() -> u64 {
    16
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatonConfig {
    /// Wolfram rule number (0-255).
    #[serde(default = "default_rule")]
    pub rule: u32,
    /// Generations to compute.
    #[serde(default = "default_generations")]
    pub generations: u64,
    /// Word width used to pack the row.
    #[serde(default)]
    pub word_bits: WordBits,
    /// Stepper implementation.
    #[serde(default)]
    pub stepper: StepperKind,
    /// Initial row.
    #[serde(default)]
    pub seed: Seed,
    /// Text output of each generation.
    #[serde(default)]
    pub render: RenderConfig,
    /// Optional history file of every generation.
    #[serde(default)]
    pub history: Option<HistoryConfig>,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            rule: default_rule(),
            generations: default_generations(),
            word_bits: WordBits::default(),
            stepper: StepperKind::default(),
            seed: Seed::default(),
            render: RenderConfig::default(),
            history: None,
        }
    }
}

/// Supported word widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WordBits {
    #[serde(rename = "8")]
    W8,
    #[serde(rename = "16")]
    W16,
    #[serde(rename = "32")]
    W32,
    #[default]
    #[serde(rename = "64")]
    W64,
    #[serde(rename = "128")]
    W128,
}

impl WordBits {
    pub fn bits(self) -> u32 {
        match self {
            WordBits::W8 => 8,
            WordBits::W16 => 16,
            WordBits::W32 => 32,
            WordBits::W64 => 64,
            WordBits::W128 => 128,
        }
    }
}

/// Text rendering of generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Print every generation (otherwise only the last).
    pub print_rows: bool,
    /// Character for live cells.
    pub alive: char,
    /// Character for dead cells.
    pub dead: char,
    /// Pad rows on the left so the pattern stays centred.
    pub centered: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            print_rows: true,
            alive: '#',
            dead: '.',
            centered: true,
        }
    }
}

/// History recording parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Output path of the history file.
    pub path: PathBuf,
    /// Frame compression.
    #[serde(default)]
    pub compression: CompressionType,
    /// Record every Nth generation (1 = every generation).
    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,
    /// Maximum frames to record (0 = unlimited).
    #[serde(default)]
    pub max_frames: u64,
}

fn default_frame_skip() -> u32 {
    1
}

impl AutomatonConfig {
    /// Validated rule.
    pub fn rule(&self) -> Result<Rule, ConfigError> {
        Ok(Rule::try_from(self.rule)?)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule()?;
        if self.render.alive == self.render.dead {
            return Err(ConfigError::IndistinctRender(self.render.alive));
        }
        if let Pattern::Random { density, .. } = self.seed.pattern {
            if !(0.0..=1.0).contains(&density) {
                return Err(ConfigError::InvalidDensity(density));
            }
        }
        if let Some(history) = &self.history {
            if history.frame_skip == 0 {
                return Err(ConfigError::InvalidFrameSkip);
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Alive and dead cells both render as {0:?}")]
    IndistinctRender(char),
    #[error("Random seed density {0} must lie in [0, 1]")]
    InvalidDensity(f64),
    #[error("History frame skip must be at least 1")]
    InvalidFrameSkip,
    #[error("Invalid automaton parameters: {0}")]
    Automaton(#[from] AutomatonError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AutomatonConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rule().unwrap().number(), 30);
    }

    #[test]
    fn test_invalid_rule() {
        let config = AutomatonConfig {
            rule: 300,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Automaton(AutomatonError::InvalidRule(300)))
        ));
    }

    #[test]
    fn test_indistinct_render() {
        let mut config = AutomatonConfig::default();
        config.render.dead = config.render.alive;
        assert!(matches!(config.validate(), Err(ConfigError::IndistinctRender('#'))));
    }

    #[test]
    fn test_invalid_density() {
        let config = AutomatonConfig {
            seed: Seed {
                pattern: Pattern::Random {
                    length: 10,
                    density: 1.5,
                    seed: 1,
                },
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDensity(_))));
    }

    #[test]
    fn test_zero_frame_skip() {
        let config = AutomatonConfig {
            history: Some(HistoryConfig {
                path: "out.ecah".into(),
                compression: CompressionType::None,
                frame_skip: 0,
                max_frames: 0,
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFrameSkip)));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config: AutomatonConfig = serde_json::from_str(r#"{"rule": 90}"#).unwrap();
        assert_eq!(config.rule, 90);
        assert_eq!(config.generations, 16);
        assert_eq!(config.word_bits, WordBits::W64);
        assert_eq!(config.stepper, StepperKind::Word);
        assert!(config.history.is_none());
    }

    #[test]
    fn test_serialization() {
        let config = AutomatonConfig {
            word_bits: WordBits::W8,
            seed: Seed::bits("1011"),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""word_bits":"8""#));
        let parsed: AutomatonConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.word_bits, WordBits::W8);
        assert_eq!(parsed.word_bits.bits(), 8);
    }
}
