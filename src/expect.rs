//! Expected-stack declarations embedded in test sources.
//!
//! A test program declares the stacks it should leave behind with comment
//! lines of the form `# Expect: 1 2 3`. Each declaration contributes one
//! stack, in file order, mapped to cells by position.

use std::path::Path;

use regex::Regex;

use crate::errors::{Error, Result};

/// Collect the declared stacks from a test source file.
pub fn expected_stacks(path: impl AsRef<Path>) -> Result<Vec<Vec<u16>>> {
    let text = std::fs::read_to_string(path)?;
    parse_expects(&text)
}

pub fn parse_expects(text: &str) -> Result<Vec<Vec<u16>>> {
    let re = Regex::new(r"# Expect:\s*((?:[0-9]+\s?)*)").unwrap();
    let mut stacks = Vec::new();
    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            let stack = caps[1]
                .split_whitespace()
                .map(|word| {
                    word.parse::<u16>()
                        .map_err(|_| Error::Expect(format!("{} is not a 16-bit word", word)))
                })
                .collect::<Result<Vec<u16>>>()?;
            stacks.push(stack);
        }
    }
    Ok(stacks)
}
