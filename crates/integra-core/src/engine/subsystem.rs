//! Subsystem specifications and conditional TPM queries.
//!
//! A specification reads `<future>t+1|<present>t=<state>`, for example
//! `ABt+1|ABCt=101`: condition on present nodes A, B, C being in joint state
//! `101` (first present node is the leftmost bit) and report the future
//! probabilities of nodes A and B. The `t+1` and `t` markers are optional.
//!
//! The returned slice is the matching TPM row restricted to the future
//! columns. It is not renormalized: entries are per-node marginals, not a
//! distribution over future joint states.

use std::fmt;
use std::str::FromStr;

use crate::engine::errors::ExecError;
use crate::engine::state_codec::{encode, parse_literal, to_literal};
use crate::engine::tpm::Tpm;

const FUTURE_MARKER: &str = "t+1";
const PRESENT_MARKER: &str = "t";

/// Parsed form of a subsystem specification string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsystemSpec {
    /// Future nodes in the order written.
    pub future: Vec<char>,
    /// Present nodes in the order written; `state[i]` belongs to `present[i]`.
    pub present: Vec<char>,
    pub state: Vec<u8>,
}

impl SubsystemSpec {
    pub fn parse(spec: &str) -> Result<Self, ExecError> {
        let (future_part, condition) = split_exactly(spec, '|', "'|'")?;
        let (present_part, literal) = split_exactly(condition, '=', "'='")?;

        let future_token = future_part.trim();
        let future_token = future_token
            .strip_suffix(FUTURE_MARKER)
            .unwrap_or(future_token);
        let present_token = present_part.trim();
        let present_token = present_token
            .strip_suffix(PRESENT_MARKER)
            .unwrap_or(present_token);

        let future = parse_nodes(future_token, "future")?;
        let present = parse_nodes(present_token, "present")?;
        let state = parse_literal(literal.trim())?;

        if state.len() != present.len() {
            return Err(ExecError::SpecFormat(format!(
                "state literal '{}' has {} bits but {} present nodes are listed",
                literal.trim(),
                state.len(),
                present.len()
            )));
        }
        Ok(Self {
            future,
            present,
            state,
        })
    }

    pub fn state_literal(&self) -> String {
        to_literal(&self.state)
    }

    pub fn future_nodes(&self) -> String {
        self.future.iter().collect()
    }

    pub fn present_nodes(&self) -> String {
        self.present.iter().collect()
    }

    /// Row of `tpm` selected by the state literal.
    ///
    /// The literal is read as a binary number, first bit most significant.
    /// Present nodes must lie in the TPM's scope but do not move bits: on a
    /// system marginalized onto `ABCDEFG`, `ABC=101` selects row 5.
    pub fn row_index(&self, tpm: &Tpm) -> Result<usize, ExecError> {
        for &node in &self.present {
            tpm.scope().require(node)?;
        }
        let index = encode(&self.state)?;
        if index >= tpm.rows() {
            return Err(ExecError::SpecFormat(format!(
                "state '{}' selects row {} but the TPM has {} rows",
                self.state_literal(),
                index,
                tpm.rows()
            )));
        }
        Ok(index)
    }

    /// Columns of `tpm` holding the future nodes, in specification order.
    pub fn future_columns(&self, tpm: &Tpm) -> Result<Vec<usize>, ExecError> {
        self.future
            .iter()
            .map(|&node| tpm.scope().require(node))
            .collect()
    }
}

impl FromStr for SubsystemSpec {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SubsystemSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}|{}{}={}",
            self.future_nodes(),
            FUTURE_MARKER,
            self.present_nodes(),
            PRESENT_MARKER,
            self.state_literal()
        )
    }
}

/// Outcome of a subsystem query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SubsystemResult {
    pub specification: String,
    pub present_nodes: String,
    pub future_nodes: String,
    pub initial_state: String,
    /// Row of the queried TPM the slice was taken from.
    pub row_index: usize,
    /// Future-node probabilities given the present state, unnormalized.
    pub slice: Vec<f64>,
}

/// Parses `spec` and extracts the conditional slice from `tpm`.
pub fn query(spec: &str, tpm: &Tpm) -> Result<SubsystemResult, ExecError> {
    let parsed = SubsystemSpec::parse(spec)?;
    let mut result = query_parsed(&parsed, tpm)?;
    result.specification = spec.to_string();
    Ok(result)
}

/// Extracts the conditional slice for an already parsed specification.
pub fn query_parsed(spec: &SubsystemSpec, tpm: &Tpm) -> Result<SubsystemResult, ExecError> {
    let row_index = spec.row_index(tpm)?;
    let columns = spec.future_columns(tpm)?;
    let row = tpm.row(row_index);
    let slice = columns.iter().map(|&c| row[c]).collect();

    Ok(SubsystemResult {
        specification: spec.to_string(),
        present_nodes: spec.present_nodes(),
        future_nodes: spec.future_nodes(),
        initial_state: spec.state_literal(),
        row_index,
        slice,
    })
}

fn split_exactly<'a>(
    s: &'a str,
    sep: char,
    label: &str,
) -> Result<(&'a str, &'a str), ExecError> {
    let mut parts = s.split(sep);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        _ => Err(ExecError::SpecFormat(format!(
            "'{}' must contain exactly one {}",
            s, label
        ))),
    }
}

fn parse_nodes(token: &str, role: &str) -> Result<Vec<char>, ExecError> {
    if token.is_empty() {
        return Err(ExecError::SpecFormat(format!("no {} nodes given", role)));
    }
    let mut nodes: Vec<char> = Vec::with_capacity(token.len());
    for c in token.chars() {
        if !c.is_ascii_uppercase() {
            return Err(ExecError::SpecFormat(format!(
                "invalid {} node '{}' in '{}'",
                role, c, token
            )));
        }
        if nodes.contains(&c) {
            return Err(ExecError::SpecFormat(format!(
                "{} node '{}' listed twice in '{}'",
                role, c, token
            )));
        }
        nodes.push(c);
    }
    Ok(nodes)
}
