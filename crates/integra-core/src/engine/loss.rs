//! Partition loss: how much predictive structure a retained edge set loses.
//!
//! Two modes share one interface:
//!
//! - [`LossMode::Constant`]: the 1-D Wasserstein distance between the
//!   flattened TPM and an all-zero vector of the same length. It ignores the
//!   edge set, so every candidate scores the same.
//! - [`LossMode::Structural`]: each future node keeps as parents only the
//!   present nodes with a retained edge into it. Its probability in state `s`
//!   is reconstructed as the mean over all states that agree with `s` on
//!   those parents. Per-node future values are Bernoulli on {0, 1}, so the
//!   earth-mover distance between truth and reconstruction is `|p - q|`; the
//!   loss is the mean of that over every state and future node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::engine::alphabet::NodeSet;
use crate::engine::errors::ExecError;
use crate::engine::partition::Partition;
use crate::engine::state_codec::project;
use crate::engine::tpm::Tpm;

/// Loss computation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossMode {
    /// Edge-set dependent reconstruction distance.
    #[default]
    Structural,
    /// Edge-set independent distance of the TPM to zero.
    Constant,
}

impl FromStr for LossMode {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "structural" => Ok(LossMode::Structural),
            "constant" => Ok(LossMode::Constant),
            other => Err(ExecError::ValidationError(format!(
                "unknown loss mode '{}', expected 'structural' or 'constant'",
                other
            ))),
        }
    }
}

impl fmt::Display for LossMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossMode::Structural => write!(f, "structural"),
            LossMode::Constant => write!(f, "constant"),
        }
    }
}

/// First Wasserstein distance between two equal-weight empirical samples.
///
/// Computed as the integral of `|F_u(x) - F_v(x)|` over the merged support.
pub fn wasserstein_1d(u: &[f64], v: &[f64]) -> Result<f64, ExecError> {
    if u.is_empty() || v.is_empty() {
        return Err(ExecError::Numerical(
            "wasserstein distance needs non-empty samples".into(),
        ));
    }
    if u.iter().chain(v).any(|x| !x.is_finite()) {
        return Err(ExecError::Numerical(
            "wasserstein distance needs finite samples".into(),
        ));
    }

    let mut us = u.to_vec();
    let mut vs = v.to_vec();
    us.sort_unstable_by(f64::total_cmp);
    vs.sort_unstable_by(f64::total_cmp);
    let mut all: Vec<f64> = us.iter().chain(&vs).copied().collect();
    all.sort_unstable_by(f64::total_cmp);

    let (nu, nv) = (us.len() as f64, vs.len() as f64);
    let mut total = 0.0;
    for w in all.windows(2) {
        let delta = w[1] - w[0];
        if delta == 0.0 {
            continue;
        }
        let cu = us.partition_point(|&x| x <= w[0]) as f64 / nu;
        let cv = vs.partition_point(|&x| x <= w[0]) as f64 / nv;
        total += (cu - cv).abs() * delta;
    }
    Ok(total)
}

/// Earth-mover distance between Bernoulli(p) and Bernoulli(q) on {0, 1}.
#[inline]
pub fn bernoulli_emd(p: f64, q: f64) -> f64 {
    (p - q).abs()
}

/// Loss evaluator bound to one TPM and one present/future grouping.
#[derive(Debug, Clone)]
pub struct LossModel<'a> {
    tpm: &'a Tpm,
    mode: LossMode,
    present: NodeSet,
    future: NodeSet,
    /// Bit position in the TPM scope of each present node.
    present_bits: Vec<usize>,
    /// TPM column of each future node.
    future_cols: Vec<usize>,
    constant: f64,
}

impl<'a> LossModel<'a> {
    pub fn new(
        tpm: &'a Tpm,
        mode: LossMode,
        present: &NodeSet,
        future: &NodeSet,
    ) -> Result<Self, ExecError> {
        let scope = tpm.scope();
        let present_bits = present
            .iter()
            .map(|n| scope.require(n))
            .collect::<Result<Vec<_>, _>>()?;
        let future_cols = future
            .iter()
            .map(|n| scope.require(n))
            .collect::<Result<Vec<_>, _>>()?;

        let constant = match mode {
            LossMode::Constant => {
                let zeros = vec![0.0; tpm.flatten().len()];
                wasserstein_1d(tpm.flatten(), &zeros)?
            }
            LossMode::Structural => 0.0,
        };

        Ok(Self {
            tpm,
            mode,
            present: present.clone(),
            future: future.clone(),
            present_bits,
            future_cols,
            constant,
        })
    }

    pub fn mode(&self) -> LossMode {
        self.mode
    }

    /// Loss of keeping exactly `edges` as the present-to-future dependencies.
    pub fn loss(&self, edges: &Partition) -> Result<f64, ExecError> {
        let parents = self.parent_bits(edges)?;
        match self.mode {
            LossMode::Constant => Ok(self.constant),
            LossMode::Structural => Ok(self.structural(&parents)),
        }
    }

    /// Per future node, the scope bit positions of its retained parents.
    fn parent_bits(&self, edges: &Partition) -> Result<Vec<SmallVec<[usize; 8]>>, ExecError> {
        let mut parents = vec![SmallVec::new(); self.future.len()];
        for edge in edges.iter() {
            let p = self.present.require(edge.present)?;
            let f = self.future.require(edge.future)?;
            parents[f].push(self.present_bits[p]);
        }
        for bits in &mut parents {
            bits.sort_unstable();
        }
        Ok(parents)
    }

    fn structural(&self, parents: &[SmallVec<[usize; 8]>]) -> f64 {
        let rows = self.tpm.rows();
        let width = self.tpm.cols();
        let mut total = 0.0;

        for (&col, bits) in self.future_cols.iter().zip(parents) {
            // parents are a subset of the scope, so the key space stays small
            let keys = 1usize << bits.len();
            let mut sums = vec![0.0; keys];
            let mut counts = vec![0usize; keys];
            for i in 0..rows {
                let key = project(i, width, bits);
                sums[key] += self.tpm.get(i, col);
                counts[key] += 1;
            }
            for i in 0..rows {
                let key = project(i, width, bits);
                let q = sums[key] / counts[key] as f64;
                total += bernoulli_emd(self.tpm.get(i, col), q);
            }
        }

        let cells = rows * self.future_cols.len();
        if cells == 0 {
            0.0
        } else {
            total / cells as f64
        }
    }
}
