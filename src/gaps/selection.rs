use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// 1-based indices into the presented list.
    Indices(BTreeSet<usize>),
    Abort,
}

/// Parse an operator selection over a list of `count` items.
///
/// Accepts `all`, `q`, or comma-separated tokens that are either an index or an
/// inclusive range `a-b` with `a <= b`. Every index must lie in `1..=count`.
pub fn parse_selection(input: &str, count: usize) -> Result<Selection, Error> {
    let input = input.trim();
    match input.to_lowercase().as_str() {
        "q" => return Ok(Selection::Abort),
        "all" => return Ok(Selection::Indices((1..=count).collect())),
        "" => return Err(Error::InvalidSelection("nothing entered".to_string())),
        _ => {}
    }

    let mut indices = BTreeSet::new();
    for token in input.split(',').map(str::trim) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start, token, count)?;
                let end = parse_index(end, token, count)?;
                if start > end {
                    return Err(Error::InvalidSelection(format!(
                        "range '{}' runs backwards",
                        token
                    )));
                }
                indices.extend(start..=end);
            }
            None => {
                indices.insert(parse_index(token, token, count)?);
            }
        }
    }
    Ok(Selection::Indices(indices))
}

fn parse_index(value: &str, token: &str, count: usize) -> Result<usize, Error> {
    let index: usize = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidSelection(format!("'{}' is not a number or range", token)))?;
    if index == 0 || index > count {
        return Err(Error::InvalidSelection(format!(
            "{} is out of range (1-{})",
            index, count
        )));
    }
    Ok(index)
}

/// Ask until the operator enters a valid selection. End of input counts as
/// `q`.
pub fn prompt_selection<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    count: usize,
) -> io::Result<Selection> {
    let mut line = String::new();

    loop {
        line.clear();
        write!(
            output,
            "Select subcategories to scrape (e.g. 1,3,5-8), 'all' or 'q' to quit: "
        )?;
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(Selection::Abort);
        }

        match parse_selection(&line, count) {
            Ok(selection) => return Ok(selection),
            Err(err) => writeln!(output, "{}", err)?,
        }
    }
}
