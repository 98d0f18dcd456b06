//! # Transition probability matrices
//!
//! [`Tpm`] is a dense, row-major `f64` matrix whose rows are present joint
//! states and whose columns are per-node future probabilities. Every matrix
//! is tagged with the [`NodeSet`] it is scoped to: row `i` is the joint state
//! `i` over that set (first node most significant) and column `j` is the
//! `j`-th node of the set.
//!
//! [`TpmStore`] owns the full-system matrix loaded from text. The text format
//! is one row per line, comma separated, optionally wrapped in brackets:
//!
//! ```text
//! [0.5, 0.5, 0, 0, 0, 0, 0, 0, 0, 0],
//! [1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
//! ```
//!
//! Loading is tolerant: tokens that are not finite numbers are dropped and
//! rows with the wrong number of fields are skipped. Both are logged with
//! `tracing::warn!` and recorded in the [`LoadReport`].

use std::fs;
use std::path::Path;

use crate::engine::alphabet::{Alphabet, NodeSet};
use crate::engine::errors::ExecError;
use crate::engine::marginalize::marginalize;
use crate::engine::state_codec;

/// Characters stripped from both ends of a line before splitting.
const LINE_TRIM: &[char] = &['[', ']', ' ', '\t', '\r', '\n', ','];

/// A transition probability matrix scoped to a node set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Tpm {
    scope: NodeSet,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Tpm {
    /// An all-zero matrix with one column per scope node.
    pub fn zeros(scope: NodeSet, rows: usize) -> Self {
        let cols = scope.len();
        Self {
            scope,
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from explicit rows; each row must have one entry per
    /// scope node.
    pub fn from_rows(scope: NodeSet, rows: Vec<Vec<f64>>) -> Result<Self, ExecError> {
        let cols = scope.len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(ExecError::DataFormat(format!(
                    "row {} has {} columns, expected {} for scope '{}'",
                    i,
                    row.len(),
                    cols,
                    scope
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            scope,
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn scope(&self) -> &NodeSet {
        &self.scope
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row_iter(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, a zero-column matrix has no meaningful rows
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Row-major view of every entry.
    pub fn flatten(&self) -> &[f64] {
        &self.data
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.row_iter().map(|r| r.iter().sum()).collect()
    }
}

/// One line skipped during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number in the source.
    pub line: usize,
    /// Number of numeric fields found.
    pub fields: usize,
    /// Number of fields a row must have.
    pub expected: usize,
}

/// One token dropped from an otherwise processed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedToken {
    pub line: usize,
    pub token: String,
}

/// What the loader accepted and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedLine>,
    pub dropped_tokens: Vec<DroppedToken>,
}

/// Owner of the validated full-system TPM and its alphabet.
#[derive(Debug, Clone)]
pub struct TpmStore {
    alphabet: Alphabet,
    full: Tpm,
    report: LoadReport,
}

impl TpmStore {
    /// Reads and parses a matrix file.
    pub fn load(path: impl AsRef<Path>, system_size: usize) -> Result<Self, ExecError> {
        let path = path.as_ref();
        tracing::info!("loading TPM from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ExecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, system_size)
    }

    /// Parses matrix text; rows must have exactly `system_size` fields.
    pub fn parse(text: &str, system_size: usize) -> Result<Self, ExecError> {
        let alphabet = Alphabet::new(system_size)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut report = LoadReport::default();
        let mut rows = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let numbers = clean_line(line, line_no, &mut report);
            if numbers.len() == system_size {
                rows.push(numbers);
            } else {
                tracing::warn!(
                    line = line_no,
                    fields = numbers.len(),
                    expected = system_size,
                    "skipping row with wrong field count"
                );
                report.rejected.push(RejectedLine {
                    line: line_no,
                    fields: numbers.len(),
                    expected: system_size,
                });
            }
        }

        if rows.is_empty() {
            return Err(ExecError::DataFormat(
                "no valid rows could be loaded".into(),
            ));
        }
        let max_rows = state_codec::state_count(system_size)?;
        if rows.len() > max_rows {
            return Err(ExecError::DataFormat(format!(
                "{} rows exceed the {} states of a {}-node system",
                rows.len(),
                max_rows,
                system_size
            )));
        }

        report.accepted = rows.len();
        let full = Tpm::from_rows(alphabet.full_set(), rows)?;
        if full.cols() != system_size {
            return Err(ExecError::DataFormat(format!(
                "expected {} columns, found {}",
                system_size,
                full.cols()
            )));
        }
        tracing::info!(
            rows = full.rows(),
            cols = full.cols(),
            rejected = report.rejected.len(),
            "TPM loaded"
        );
        Ok(Self {
            alphabet,
            full,
            report,
        })
    }

    /// Wraps an already built full-system matrix; its scope must be the
    /// whole alphabet.
    pub fn from_tpm(full: Tpm) -> Result<Self, ExecError> {
        let alphabet = Alphabet::new(full.cols())?;
        if full.scope() != &alphabet.full_set() {
            return Err(ExecError::DataFormat(format!(
                "full TPM scope '{}' is not the alphabet '{}'",
                full.scope(),
                alphabet
            )));
        }
        let max_rows = state_codec::state_count(alphabet.len())?;
        if full.rows() == 0 || full.rows() > max_rows {
            return Err(ExecError::DataFormat(format!(
                "full TPM must have between 1 and {} rows, got {}",
                max_rows,
                full.rows()
            )));
        }
        let report = LoadReport {
            accepted: full.rows(),
            ..LoadReport::default()
        };
        Ok(Self {
            alphabet,
            full,
            report,
        })
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn system_size(&self) -> usize {
        self.alphabet.len()
    }

    pub fn full_tpm(&self) -> &Tpm {
        &self.full
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Projects the full matrix onto `candidate` (an unordered node string).
    pub fn marginalize(&self, candidate: &str) -> Result<Tpm, ExecError> {
        let nodes = self.alphabet.node_set(candidate)?;
        marginalize(&self.full, &nodes)
    }
}

/// Extracts the numeric fields of one line, dropping anything else.
fn clean_line(line: &str, line_no: usize, report: &mut LoadReport) -> Vec<f64> {
    let trimmed = line.trim_matches(LINE_TRIM);
    let mut numbers = Vec::new();
    for token in trimmed.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => numbers.push(v),
            _ => {
                tracing::warn!(line = line_no, token, "dropping non-numeric value");
                report.dropped_tokens.push(DroppedToken {
                    line: line_no,
                    token: token.to_string(),
                });
            }
        }
    }
    numbers
}
