use bitvec::prelude::*;
use itertools::Itertools;
use miette::*;

use crate::{driver, Machine, Unsolvable};

type Row = BitVec<usize, Lsb0>;

/// Assignments of more free buttons than this are not enumerated.
pub const MAX_FREE_VARIABLES: usize = 20;

/// Light equations over GF(2): one bit row per light holding the buttons
/// that toggle it, with the target state in the last column.
struct LightSystem {
    rows: Vec<Row>,
    num_buttons: usize,
    /// Pivot column of each of the first `rank` rows, strictly increasing.
    pivots: Vec<usize>,
    free_vars: Vec<usize>,
}

impl LightSystem {
    fn new(machine: &Machine) -> Self {
        let num_buttons = machine.buttons.len();
        let mut rows: Vec<Row> = machine
            .lights
            .iter()
            .map(|&on| {
                let mut row = Row::repeat(false, num_buttons + 1);
                row.set(num_buttons, on);
                row
            })
            .collect();

        for (button, lights) in machine.buttons.iter().enumerate() {
            for &light in lights {
                if let Some(row) = rows.get_mut(light) {
                    row.set(button, true);
                }
            }
        }

        Self {
            rows,
            num_buttons,
            pivots: Vec::new(),
            free_vars: Vec::new(),
        }
    }

    fn rank(&self) -> usize {
        self.pivots.len()
    }

    /// Reduces the rows column by column. The first row at or below the rank
    /// with a set bit becomes the pivot and is XORed into every other row
    /// holding that bit, leaving each pivot column with a single one.
    fn eliminate(&mut self) {
        for col in 0..self.num_buttons {
            let rank = self.rank();
            let Some(offset) = self.rows[rank..].iter().position(|row| row[col]) else {
                continue;
            };
            self.rows.swap(rank, rank + offset);

            let (above, rest) = self.rows.split_at_mut(rank);
            let Some((pivot, below)) = rest.split_first_mut() else {
                break;
            };
            for row in above.iter_mut().chain(below) {
                if row[col] {
                    *row ^= &*pivot;
                }
            }

            self.pivots.push(col);
            if self.rank() == self.rows.len() {
                break;
            }
        }

        self.free_vars = (0..self.num_buttons)
            .filter(|col| !self.pivots.contains(col))
            .collect_vec();
    }

    /// A row past the rank is zero in A, so a set target bit reads `0 = 1`.
    fn is_consistent(&self) -> bool {
        self.rows[self.rank()..]
            .iter()
            .all(|row| !row[self.num_buttons])
    }

    /// Fills in the pivot buttons of `presses` from its free buttons, last
    /// pivot row first: each pivot is the target bit XOR the parity of the
    /// presses to its right.
    fn back_substitute(&self, presses: &mut Row) {
        let n = self.num_buttons;
        for (row, &col) in self.rows.iter().zip(&self.pivots).rev() {
            let parity = row[col + 1..n]
                .iter_ones()
                .filter(|&k| presses[col + 1 + k])
                .count()
                % 2
                == 1;
            presses.set(col, row[n] ^ parity);
        }
    }

    /// Fewest presses over every assignment of the free buttons.
    fn min_presses(&mut self) -> std::result::Result<u64, Unsolvable> {
        self.eliminate();
        if !self.is_consistent() {
            return Err(Unsolvable::Inconsistent);
        }

        let free = self.free_vars.len();
        tracing::debug!(rank = self.rank(), free, "reduced light system");
        if free > MAX_FREE_VARIABLES {
            return Err(Unsolvable::TooManyFreeVariables {
                free,
                limit: MAX_FREE_VARIABLES,
            });
        }

        let mut presses = Row::repeat(false, self.num_buttons);
        let fewest = (0..1usize << free)
            .map(|assignment| {
                for (bit, &col) in self.free_vars.iter().enumerate() {
                    presses.set(col, assignment >> bit & 1 == 1);
                }
                self.back_substitute(&mut presses);
                presses.count_ones()
            })
            .min()
            .unwrap_or(0);

        Ok(fewest as u64)
    }
}

/// Fewest presses that switch on exactly the lights marked `#`.
pub fn min_presses(machine: &Machine) -> std::result::Result<u64, Unsolvable> {
    LightSystem::new(machine).min_presses()
}

#[tracing::instrument(skip(input))]
pub fn process(input: &str) -> Result<String> {
    let total_presses = driver::total_presses(input, min_presses)?;
    Ok(total_presses.to_string())
}
