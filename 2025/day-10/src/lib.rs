//! Factory machine initialisation: fewest button presses that bring every
//! machine to its target state.
//!
//! `part1` treats buttons as light toggles (linear algebra over GF(2)),
//! `part2` treats them as joltage increments (non-negative integer system).

use std::fmt;

pub mod driver;
pub mod machine;
pub mod part1;
pub mod part2;

pub use machine::Machine;

/// Why a machine contributes no presses to the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsolvable {
    /// Elimination left an equation `0 = nonzero`.
    Inconsistent,
    /// Too many free variables to enumerate every assignment.
    TooManyFreeVariables { free: usize, limit: usize },
    /// The system is consistent but has no non-negative integer solution.
    NoSolution,
    /// Fraction-free elimination outgrew 64-bit coefficients.
    Overflow,
}

impl fmt::Display for Unsolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsolvable::Inconsistent => write!(f, "inconsistent system"),
            Unsolvable::TooManyFreeVariables { free, limit } => {
                write!(f, "{free} free variables exceeds the limit of {limit}")
            }
            Unsolvable::NoSolution => write!(f, "no non-negative integer solution"),
            Unsolvable::Overflow => write!(f, "coefficient overflow during elimination"),
        }
    }
}

impl std::error::Error for Unsolvable {}
