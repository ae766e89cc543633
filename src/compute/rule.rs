//! Elementary rule engine.
//!
//! A rule number's 8-bit expansion is the truth table of the next cell
//! state: bit `l*4 + c*2 + r` holds the outcome for the neighborhood
//! (left, center, right), so (1,1,1) is bit 7 and (0,0,0) is bit 0.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{AutomatonError, Word};

/// An elementary rule (Wolfram code 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule(u8);

impl Rule {
    #[inline]
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// Wolfram code.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Next state of a cell given its neighborhood.
    #[inline]
    pub const fn apply(self, left: bool, center: bool, right: bool) -> bool {
        let index = (left as u8) << 2 | (center as u8) << 1 | right as u8;
        (self.0 >> index) & 1 == 1
    }

    /// Lane-wise [`Rule::apply`] over whole words.
    ///
    /// Bit `i` of the result is `apply(left[i], center[i], right[i])`. The
    /// result is the union of the minterms whose rule bit is set.
    #[inline]
    pub fn apply_word<W: Word>(self, left: W, center: W, right: W) -> W {
        let mut out = W::ZERO;
        for pattern in 0..8u8 {
            if (self.0 >> pattern) & 1 == 0 {
                continue;
            }
            let l = if pattern & 0b100 != 0 { left } else { !left };
            let c = if pattern & 0b010 != 0 { center } else { !center };
            let r = if pattern & 0b001 != 0 { right } else { !right };
            out |= l & c & r;
        }
        out
    }

    /// Left/right reflection of the rule.
    pub const fn mirror(self) -> Self {
        let mut mirrored = 0u8;
        let mut pattern = 0;
        while pattern < 8 {
            if (self.0 >> pattern) & 1 == 1 {
                let reflected = (pattern & 0b100) >> 2 | (pattern & 0b010) | (pattern & 0b001) << 2;
                mirrored |= 1 << reflected;
            }
            pattern += 1;
        }
        Self(mirrored)
    }

    /// Rule obtained by exchanging the roles of 0 and 1.
    pub const fn complement(self) -> Self {
        let mut complemented = 0u8;
        let mut pattern = 0;
        while pattern < 8 {
            if (self.0 >> pattern) & 1 == 0 {
                complemented |= 1 << (7 - pattern);
            }
            pattern += 1;
        }
        Self(complemented)
    }

    /// Iterator over all 256 rules in ascending order.
    pub fn all() -> impl Iterator<Item = Rule> {
        (0..=u8::MAX).map(Rule)
    }
}

macro_rules! impl_rule_try_from {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Rule {
                type Error = AutomatonError;

                fn try_from(value: $t) -> Result<Self, Self::Error> {
                    u8::try_from(value)
                        .map(Rule)
                        .map_err(|_| AutomatonError::InvalidRule(value as i128))
                }
            }
        )*
    };
}

impl_rule_try_from!(i32, i64, u16, u32, u64, usize);

impl From<Rule> for u8 {
    fn from(rule: Rule) -> Self {
        rule.0
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rule {}", self.0)
    }
}

impl FromStr for Rule {
    type Err = AutomatonError;

    /// Accepts `"30"`, `"rule30"` and `"Rule 30"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("rule") => trimmed[4..].trim_start(),
            _ => trimmed,
        };
        let value: i128 = digits
            .parse()
            .map_err(|_| AutomatonError::InvalidRuleName(s.to_string()))?;
        u8::try_from(value)
            .map(Rule)
            .map_err(|_| AutomatonError::InvalidRule(value))
    }
}

/// Well-known rules.
pub mod rules {
    use super::Rule;

    /// Chaotic; used as a pseudo-random generator.
    pub const RULE_30: Rule = Rule::new(30);
    /// Sierpinski triangle (left XOR right).
    pub const RULE_90: Rule = Rule::new(90);
    /// Turing complete.
    pub const RULE_110: Rule = Rule::new(110);
    /// Traffic flow.
    pub const RULE_184: Rule = Rule::new(184);
    /// Simple growth.
    pub const RULE_250: Rule = Rule::new(250);
}
