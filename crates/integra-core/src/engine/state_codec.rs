//! Binary state codec.
//!
//! A joint state over `k` ordered nodes is a bitstring of width `k`, first
//! node as the most significant bit. Widths are always passed explicitly: the
//! same index means different states at different widths.

use crate::engine::errors::ExecError;

/// Widest joint state that fits an index.
pub const MAX_WIDTH: usize = (usize::BITS - 1) as usize;

fn check_width(width: usize) -> Result<(), ExecError> {
    if width > MAX_WIDTH {
        return Err(ExecError::ValidationError(format!(
            "state width {} exceeds maximum {}",
            width, MAX_WIDTH
        )));
    }
    Ok(())
}

/// Number of joint states over `width` binary nodes.
pub fn state_count(width: usize) -> Result<usize, ExecError> {
    check_width(width)?;
    Ok(1usize << width)
}

/// Encodes an ordered bit sequence as a state index.
pub fn encode(bits: &[u8]) -> Result<usize, ExecError> {
    check_width(bits.len())?;
    bits.iter().try_fold(0usize, |acc, &bit| match bit {
        0 | 1 => Ok((acc << 1) | bit as usize),
        other => Err(ExecError::ValidationError(format!(
            "state bit must be 0 or 1, got {}",
            other
        ))),
    })
}

/// Decodes `index` into a zero-padded bit sequence of `width` bits.
pub fn decode(index: usize, width: usize) -> Result<Vec<u8>, ExecError> {
    let count = state_count(width)?;
    if index >= count {
        return Err(ExecError::ValidationError(format!(
            "state index {} does not fit in {} bits",
            index, width
        )));
    }
    Ok((0..width).map(|pos| bit_at(index, width, pos)).collect())
}

/// Bit of node `position` in the state `index` of the given width.
#[inline]
pub fn bit_at(index: usize, width: usize, position: usize) -> u8 {
    ((index >> (width - 1 - position)) & 1) as u8
}

/// Projects a state onto a subset of its positions.
///
/// `positions` lists, in the order of the target encoding, which positions of
/// the source state (width `width`) are kept.
pub fn project(index: usize, width: usize, positions: &[usize]) -> usize {
    positions
        .iter()
        .fold(0usize, |acc, &pos| (acc << 1) | bit_at(index, width, pos) as usize)
}

/// Parses a state literal such as `"101"`.
pub fn parse_literal(literal: &str) -> Result<Vec<u8>, ExecError> {
    if literal.is_empty() {
        return Err(ExecError::SpecFormat("empty state literal".into()));
    }
    literal
        .chars()
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            other => Err(ExecError::SpecFormat(format!(
                "state literal '{}' contains non-binary character '{}'",
                literal, other
            ))),
        })
        .collect()
}

/// Formats bits as a literal such as `"101"`.
pub fn to_literal(bits: &[u8]) -> String {
    bits.iter().map(|b| if *b == 0 { '0' } else { '1' }).collect()
}
