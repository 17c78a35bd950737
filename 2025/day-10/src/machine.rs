use std::fmt::Display;
use std::str::FromStr;

use chumsky::prelude::*;
use miette::*;

/// One machine description: `[.##.] (3) (1,3) (2) {3,5,4}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    /// Indicator light diagram, `#` is on.
    pub lights: Vec<bool>,
    /// Joltage requirement of every counter.
    pub joltage: Vec<u64>,
    /// Indices each button toggles or increments, in input order.
    pub buttons: Vec<Vec<usize>>,
}

type Span = SimpleSpan;

#[derive(Debug, Clone)]
enum Block {
    Lights(Vec<bool>),
    Button(Vec<(usize, Span)>),
    Joltage(Vec<u64>),
    /// Any character outside a well-formed block.
    Skipped(char),
}

fn number<'a, T>() -> impl Parser<'a, &'a str, T, extra::Err<Rich<'a, char>>> + Clone
where
    T: FromStr,
    T::Err: Display,
{
    text::int(10).try_map(|digits: &str, span| {
        digits
            .parse::<T>()
            .map_err(|e| Rich::custom(span, e))
    })
}

fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Block>, extra::Err<Rich<'a, char>>> {
    let hspace = one_of(" \t").repeated();

    let light = choice((just('.').to(false), just('#').to(true)));

    // [.##.]
    let lights = light
        .repeated()
        .collect::<Vec<bool>>()
        .delimited_by(just('['), just(']'))
        .map(Block::Lights);

    // (0,2,3), spans kept for range diagnostics
    let button = number::<usize>()
        .map_with(|idx, e| (idx, e.span()))
        .separated_by(just(','))
        .collect::<Vec<_>>()
        .delimited_by(just('('), just(')'))
        .map(Block::Button);

    // {3,5,4,7}
    let joltage = number::<u64>()
        .separated_by(just(','))
        .collect::<Vec<u64>>()
        .delimited_by(just('{'), just('}'))
        .map(Block::Joltage);

    // Blocks are picked out wherever they appear, anything else is skipped
    let skipped = any().map(Block::Skipped);

    choice((lights, button, joltage))
        .padded_by(hspace)
        .or(skipped)
        .repeated()
        .collect()
}

impl Machine {
    /// Parses a single line.
    ///
    /// Each block is extracted wherever it appears on the line; a missing
    /// diagram or joltage list stays empty and characters outside any block
    /// are skipped with a warning. A button index outside the light diagram
    /// or the joltage list is an error.
    pub fn parse(line: &str) -> Result<Self> {
        let blocks = parser()
            .parse(line)
            .into_result()
            .map_err(|e| miette!("Parse failed: {:?}", e))?;

        let mut lights = None;
        let mut joltage = None;
        let mut buttons = Vec::new();
        let mut skipped = String::new();
        for block in blocks {
            match block {
                Block::Lights(diagram) if lights.is_none() => lights = Some(diagram),
                Block::Joltage(levels) if joltage.is_none() => joltage = Some(levels),
                Block::Lights(_) | Block::Joltage(_) => {}
                Block::Button(indices) => buttons.push(indices),
                Block::Skipped(c) => skipped.push(c),
            }
        }
        if !skipped.trim().is_empty() {
            tracing::warn!(line, skipped = skipped.trim(), "skipped unrecognised input");
        }

        let widths = [
            lights.as_ref().map(|l| (l.len(), "lights")),
            joltage.as_ref().map(|j| (j.len(), "joltage counters")),
        ];
        for &(idx, span) in buttons.iter().flatten() {
            for (width, what) in widths.iter().flatten() {
                if idx >= *width {
                    return Err(miette!(
                        labels = vec![LabeledSpan::at(span.start..span.end, "out of range")],
                        help = format!("this machine only has {width} {what}"),
                        "button index {idx} is out of range"
                    )
                    .with_source_code(line.to_string()));
                }
            }
        }

        Ok(Self {
            lights: lights.unwrap_or_default(),
            joltage: joltage.unwrap_or_default(),
            buttons: buttons
                .into_iter()
                .map(|indices| indices.into_iter().map(|(idx, _)| idx).collect())
                .collect(),
        })
    }
}
