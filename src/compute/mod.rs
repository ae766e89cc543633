//! Compute module - Rows, rules and generation steppers.

mod automaton;
mod error;
mod row;
mod rule;
mod stepper;
mod word;

pub mod batch;

pub use automaton::*;
pub use error::*;
pub use row::*;
pub use rule::*;
pub use stepper::*;
pub use word::*;
