//! Marginalization of a TPM onto a node subset.
//!
//! Every source state `i` is decoded at the source width, projected onto the
//! candidate positions (alphabet order) and re-encoded as a reduced state `j`.
//! The candidate columns of row `i` are added into row `j`; once all rows are
//! accumulated, each reduced row is divided by its sum. Rows summing to
//! exactly zero are left untouched so no NaNs are produced.
//!
//! The reduction is many-to-one: `2^(n-k)` source states land on each reduced
//! state and their values are summed before normalization, never averaged.

use crate::engine::alphabet::NodeSet;
use crate::engine::errors::ExecError;
use crate::engine::state_codec::{project, state_count};
use crate::engine::tpm::Tpm;

/// Projects `full` onto `candidate`, producing a `2^k x k` row-normalized TPM
/// scoped to `candidate`.
pub fn marginalize(full: &Tpm, candidate: &NodeSet) -> Result<Tpm, ExecError> {
    if candidate.is_empty() {
        return Err(ExecError::ValidationError(
            "candidate node set must not be empty".into(),
        ));
    }
    let scope = full.scope();
    let width = scope.len();
    let positions = candidate
        .iter()
        .map(|node| scope.require(node))
        .collect::<Result<Vec<_>, _>>()?;

    if full.rows() > state_count(width)? {
        return Err(ExecError::DataFormat(format!(
            "TPM has {} rows but scope '{}' only has {} states",
            full.rows(),
            scope,
            state_count(width)?
        )));
    }

    let mut reduced = Tpm::zeros(candidate.clone(), state_count(candidate.len())?);
    for i in 0..full.rows() {
        let j = project(i, width, &positions);
        let src = full.row(i);
        for (dst, &col) in reduced.row_mut(j).iter_mut().zip(&positions) {
            *dst += src[col];
        }
    }
    normalize_rows(&mut reduced);

    tracing::info!(
        candidate = %candidate,
        rows = reduced.rows(),
        cols = reduced.cols(),
        "system marginalized"
    );
    Ok(reduced)
}

/// Divides each row by its sum; zero-sum rows are left as they are.
pub fn normalize_rows(tpm: &mut Tpm) {
    for i in 0..tpm.rows() {
        let row = tpm.row_mut(i);
        let sum: f64 = row.iter().sum();
        if sum != 0.0 {
            for v in row.iter_mut() {
                *v /= sum;
            }
        }
    }
}
