//! Elementary cellular automata on word-packed, growing rows.
//!
//! Each generation applies one of the 256 Wolfram rules to every
//! three-cell neighborhood of the row. Cells outside the row are dead, so
//! the row grows by two cells per generation and is never truncated. Cells
//! are packed most significant bit first into machine words, and the
//! default stepper updates a whole word of cells with a handful of shifts
//! and boolean operations.
//!
//! # Architecture
//!
//! - `compute`: rows, rules, steppers and the stateful automaton
//! - `schema`: configuration types and seeding for runs
//! - `history`: binary recording and playback of generations
//!
//! # Example
//!
//! ```rust,no_run
//! use elementary_ca::{Automaton, Row, rules};
//!
//! let mut automaton = Automaton::from_row(Row::<u64>::single_cell());
//! automaton.advance(rules::RULE_30, 3)?;
//!
//! assert_eq!(automaton.generation_size(), 7);
//! println!("{}", automaton.print());
//! # Ok::<(), elementary_ca::AutomatonError>(())
//! ```

pub mod compute;
pub mod history;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    Automaton, AutomatonError, AutomatonStats, NaiveStepper, Row, Rule, Stepper, StepperKind,
    Word, WordStepper, rules,
};
pub use schema::{AutomatonConfig, Pattern, Seed};
