use itertools::Itertools;
use miette::*;
use nalgebra::DMatrix;
use num_integer::Integer;

use crate::{driver, Machine, Unsolvable};

// -----------------------------------------------------------------------------
// Domain Models
// -----------------------------------------------------------------------------

/// Augmented system [A | b] over the integers, one row per joltage counter
/// and one column per button.
#[derive(Clone, Debug)]
struct JoltageSystem {
    matrix: DMatrix<i64>,
    num_vars: usize,
    num_eqs: usize,
    /// Pivot column of each of the first `rank` rows, strictly increasing.
    pivots: Vec<usize>,
    /// Columns without a pivot, searched by branch and bound.
    free_vars: Vec<usize>,
    /// Largest press count each button can take in any solution: the
    /// smallest requirement among the counters it increments.
    capacity: Vec<i64>,
}

impl JoltageSystem {
    fn new(machine: &Machine) -> std::result::Result<Self, Unsolvable> {
        let num_eqs = machine.joltage.len();
        let num_vars = machine.buttons.len();

        let joltage: Vec<i64> = machine
            .joltage
            .iter()
            .map(|&level| i64::try_from(level).map_err(|_| Unsolvable::Overflow))
            .collect::<std::result::Result<_, _>>()?;

        let mut matrix = DMatrix::<i64>::zeros(num_eqs, num_vars + 1);
        for (col, rows) in machine.buttons.iter().enumerate() {
            for &row in rows {
                if row < num_eqs {
                    matrix[(row, col)] = 1;
                }
            }
        }
        for (row, &level) in joltage.iter().enumerate() {
            matrix[(row, num_vars)] = level;
        }

        let capacity = machine
            .buttons
            .iter()
            .map(|rows| {
                rows.iter()
                    .filter_map(|&row| joltage.get(row).copied())
                    .min()
                    .unwrap_or(0)
            })
            .collect();

        Ok(Self {
            matrix,
            num_vars,
            num_eqs,
            pivots: Vec::new(),
            free_vars: Vec::new(),
            capacity,
        })
    }

    fn rank(&self) -> usize {
        self.pivots.len()
    }

    /// Fraction-free Gauss-Jordan elimination.
    ///
    /// Every other row `i` becomes `row_i * pivot - row_pivot * row_i[col]`,
    /// which keeps all entries integral. Rows are then divided by the gcd of
    /// their entries so coefficients stay small.
    fn eliminate(&mut self) -> std::result::Result<(), Unsolvable> {
        let n = self.num_vars;

        for col in 0..n {
            let rank = self.rank();
            if rank >= self.num_eqs {
                break;
            }

            let Some(pivot_row) = (rank..self.num_eqs).find(|&r| self.matrix[(r, col)] != 0)
            else {
                continue;
            };
            self.matrix.swap_rows(rank, pivot_row);

            let pivot = self.matrix[(rank, col)];
            for r in 0..self.num_eqs {
                let factor = self.matrix[(r, col)];
                if r == rank || factor == 0 {
                    continue;
                }
                for c in 0..=n {
                    let scaled = self.matrix[(r, c)].checked_mul(pivot);
                    let removed = self.matrix[(rank, c)].checked_mul(factor);
                    self.matrix[(r, c)] = scaled
                        .zip(removed)
                        .and_then(|(a, b)| a.checked_sub(b))
                        .ok_or(Unsolvable::Overflow)?;
                }
                self.normalize_row(r);
            }

            self.pivots.push(col);
        }

        self.free_vars = (0..n).filter(|c| !self.pivots.contains(c)).collect_vec();
        Ok(())
    }

    fn normalize_row(&mut self, r: usize) {
        let n = self.num_vars;
        let gcd = (0..=n).fold(0i64, |acc, c| acc.gcd(&self.matrix[(r, c)]));
        if gcd > 1 {
            for c in 0..=n {
                self.matrix[(r, c)] /= gcd;
            }
        }
    }

    /// Looks for a row `0 = nonzero` past the rank.
    fn is_consistent(&self) -> bool {
        let n = self.num_vars;
        (self.rank()..self.num_eqs).all(|r| {
            (0..n).any(|c| self.matrix[(r, c)] != 0) || self.matrix[(r, n)] == 0
        })
    }
}

// -----------------------------------------------------------------------------
// Branch & Bound over the free variables
// -----------------------------------------------------------------------------

struct Search<'a> {
    system: &'a JoltageSystem,
    /// Press count of every button; free slots hold the current branch,
    /// pivot slots are overwritten at each leaf.
    values: Vec<i64>,
    /// Totals are kept in `i128` so sums of 64-bit press counts cannot wrap.
    best: Option<i128>,
}

impl<'a> Search<'a> {
    fn new(system: &'a JoltageSystem) -> Self {
        Self {
            system,
            values: vec![0; system.num_vars],
            best: None,
        }
    }

    fn solve(mut self) -> Option<i128> {
        self.branch(0, 0);
        self.best
    }

    fn exceeds_best(&self, presses: i128) -> bool {
        self.best.is_some_and(|best| presses >= best)
    }

    /// Assigns free variable `depth`, values ascending from zero.
    ///
    /// `partial` is the sum of the free variables assigned so far. Pivot
    /// values are never negative in a valid leaf, so once `partial` reaches
    /// the best total no completion of this branch can improve it.
    fn branch(&mut self, depth: usize, partial: i128) {
        if self.exceeds_best(partial) {
            return;
        }

        let system = self.system;
        if depth == system.free_vars.len() {
            if let Some(total) = self.back_substitute() {
                self.best = Some(self.best.map_or(total, |best| best.min(total)));
            }
            return;
        }

        let var = system.free_vars[depth];
        for value in 0..=system.capacity[var] {
            let presses = partial + i128::from(value);
            if self.exceeds_best(presses) {
                break;
            }
            self.values[var] = value;
            self.branch(depth + 1, presses);
        }
        self.values[var] = 0;
    }

    /// Solves pivot rows from last to first. Returns the total presses, or
    /// `None` if a pivot value is fractional or negative.
    fn back_substitute(&mut self) -> Option<i128> {
        let system = self.system;
        let m = &system.matrix;
        let n = system.num_vars;

        for (row, &col) in system.pivots.iter().enumerate().rev() {
            let rhs = ((col + 1)..n).fold(i128::from(m[(row, n)]), |acc, c| {
                acc - i128::from(m[(row, c)]) * i128::from(self.values[c])
            });

            let (value, remainder) = rhs.div_rem(&i128::from(m[(row, col)]));
            if remainder != 0 || value < 0 {
                return None;
            }
            self.values[col] = i64::try_from(value).ok()?;
        }

        Some(self.values.iter().map(|&v| i128::from(v)).sum())
    }
}

// -----------------------------------------------------------------------------
// Entry Point
// -----------------------------------------------------------------------------

/// Fewest presses that raise every counter exactly to its joltage requirement.
pub fn min_presses(machine: &Machine) -> std::result::Result<u64, Unsolvable> {
    let mut system = JoltageSystem::new(machine)?;
    system.eliminate()?;
    if !system.is_consistent() {
        return Err(Unsolvable::Inconsistent);
    }

    tracing::debug!(
        rank = system.rank(),
        free = system.free_vars.len(),
        "reduced joltage system"
    );

    let presses = Search::new(&system).solve().ok_or(Unsolvable::NoSolution)?;
    u64::try_from(presses).map_err(|_| Unsolvable::Overflow)
}

#[tracing::instrument(skip(input))]
pub fn process(input: &str) -> Result<String> {
    let total = driver::total_presses(input, min_presses)?;
    Ok(total.to_string())
}
