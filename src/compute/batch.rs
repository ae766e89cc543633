//! Parallel runs over independent automata.
//!
//! Rows share no state, so each job is evaluated on its own rayon worker.

use rayon::prelude::*;

use super::{AutomatonError, Row, Rule, Stepper, StepperKind, Word};

/// One independent run: a seed row, a rule and a generation count.
#[derive(Debug, Clone)]
pub struct BatchJob<W: Word = u64> {
    pub seed: Row<W>,
    pub rule: Rule,
    pub generations: u64,
}

/// Evaluate every job in parallel. Results are returned in job order.
pub fn run_batch<W: Word>(
    jobs: &[BatchJob<W>],
    stepper: StepperKind,
) -> Vec<Result<Row<W>, AutomatonError>> {
    log::debug!("running batch of {} jobs with {:?} stepper", jobs.len(), stepper);
    jobs.par_iter()
        .map(|job| stepper.step_n(&job.seed, job.rule, job.generations))
        .collect()
}

/// Advance `seed` under each of the 256 rules, in rule order.
pub fn sweep_rules<W: Word>(
    seed: &Row<W>,
    generations: u64,
    stepper: StepperKind,
) -> Result<Vec<(Rule, Row<W>)>, AutomatonError> {
    let rules: Vec<Rule> = Rule::all().collect();
    rules
        .into_par_iter()
        .map(|rule| stepper.step_n(seed, rule, generations).map(|row| (rule, row)))
        .collect()
}
