use miette::*;

use aoc2025_day_10::{driver, part2};

fn main() -> Result<()> {
    driver::init_tracing();
    let input = driver::InputSelection::from_args(std::env::args().skip(1)).read()?;
    let result = part2::process(&input)?;
    println!("Total minimum presses: {}", result);
    Ok(())
}
