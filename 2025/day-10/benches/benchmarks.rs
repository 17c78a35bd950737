use aoc2025_day_10::{part1, part2};

const EXAMPLE: &str = include_str!("../example.txt");

fn main() {
    divan::main();
}

#[divan::bench]
fn bench_part1() {
    part1::process(divan::black_box(EXAMPLE)).unwrap();
}

#[divan::bench]
fn bench_part2() {
    part2::process(divan::black_box(EXAMPLE)).unwrap();
}
