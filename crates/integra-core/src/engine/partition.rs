//! # Minimum-loss partition search
//!
//! A partition is a subset of the complete bipartite edge set between a
//! present-node group and a future-node group. The search grows a sequence
//! `W[0] ⊂ W[1] ⊂ ... ⊂ W[m]` one edge at a time:
//!
//! - `W[0] = ∅`, `W[1] = {first edge}` (present-major, future-minor order)
//! - for `i = 2..=m`, add the remaining edge `e` minimizing
//!   `loss(W[i-1] ∪ {e}) - loss({e})`; ties go to the earliest edge
//! - after each such step, a valid `W[i]` whose loss is strictly below the
//!   best so far becomes the best partition
//!
//! The search always runs to `W[m]` and costs O(m²) loss evaluations.
//! Search state lives inside one [`PartitionAnalyzer::analyze_partitions`]
//! call; the analyzer itself is never mutated, so repeated or concurrent
//! searches on the same analyzer are independent.
//!
//! ## Feature gating
//!
//! With the `parallel` feature, candidate edges of each step are scored with
//! rayon. The minimum is still taken in enumeration order, so results match
//! the sequential path exactly.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::alphabet::{Alphabet, NodeSet, MAX_SYSTEM_SIZE};
use crate::engine::errors::ExecError;
use crate::engine::loss::{LossMode, LossModel};
use crate::engine::tpm::Tpm;

/// Directed dependency "present node influences future node".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub present: char,
    pub future: char,
}

impl Edge {
    pub fn new(present: char, future: char) -> Self {
        Self { present, future }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.present, self.future)
    }
}

/// An ordered set of present-to-future edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Partition(BTreeSet<Edge>);

impl Partition {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, edge: &Edge) -> bool {
        self.0.contains(edge)
    }

    pub fn insert(&mut self, edge: Edge) -> bool {
        self.0.insert(edge)
    }

    /// `self ∪ {edge}`
    pub fn with(&self, edge: Edge) -> Partition {
        let mut out = self.clone();
        out.insert(edge);
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.0.iter()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.0.iter().copied().collect()
    }

    pub fn is_subset(&self, other: &Partition) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl FromIterator<Edge> for Partition {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Partition(iter.into_iter().collect())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, edge) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", edge)?;
        }
        write!(f, "}}")
    }
}

/// Which time slice a vertex belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Present,
    Future,
}

/// A node at one time slice; `A` at `t` and `A` at `t+1` are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub node: char,
    pub side: Side,
}

impl Vertex {
    pub fn present(node: char) -> Self {
        Self {
            node,
            side: Side::Present,
        }
    }

    pub fn future(node: char) -> Self {
        Self {
            node,
            side: Side::Future,
        }
    }
}

/// Whether the undirected graph over `pairs` admits a proper 2-coloring.
///
/// Every pair must join a present vertex to a future vertex; a same-side
/// pair (self-loops included) fails outright. Colors are then assigned by
/// BFS and any edge joining two vertices of the same color fails.
pub fn is_two_colorable(pairs: impl IntoIterator<Item = (Vertex, Vertex)>) -> bool {
    let mut adjacency: FxHashMap<Vertex, SmallVec<[Vertex; 4]>> = FxHashMap::default();
    for (a, b) in pairs {
        if a.side == b.side {
            return false;
        }
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }

    let mut color: FxHashMap<Vertex, bool> = FxHashMap::default();
    let mut queue = VecDeque::new();
    for &start in adjacency.keys() {
        if color.contains_key(&start) {
            continue;
        }
        color.insert(start, false);
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            let c = color[&v];
            for &w in &adjacency[&v] {
                match color.get(&w) {
                    Some(&cw) if cw == c => return false,
                    Some(_) => {}
                    None => {
                        color.insert(w, !c);
                        queue.push_back(w);
                    }
                }
            }
        }
    }
    true
}

/// Validity gate for candidate partitions: the edge set, with present and
/// future endpoints as distinct vertices, must be 2-colorable.
pub fn is_valid_partition(partition: &Partition) -> bool {
    is_two_colorable(
        partition
            .iter()
            .map(|e| (Vertex::present(e.present), Vertex::future(e.future))),
    )
}

/// Result of one partition search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct PartitionReport {
    /// Lowest-loss valid partition, `None` when no step was scored.
    pub best_partition: Option<Partition>,
    pub min_loss: Option<f64>,
    /// Wall-clock seconds spent searching.
    pub execution_time: f64,
    pub present_nodes: String,
    pub future_nodes: String,
    /// `W[0..=m]`
    pub sequence: Vec<Partition>,
}

impl PartitionReport {
    /// Graphviz rendering of the best partition: present nodes in one rank,
    /// future nodes in the next, one arrow per retained edge. `None` when
    /// the search found no partition.
    pub fn to_dot(&self) -> Option<String> {
        let best = self.best_partition.as_ref()?;
        let mut dot = String::from("digraph partition {\n    rankdir=LR;\n");
        dot.push_str("    subgraph present { rank=same;");
        for node in self.present_nodes.chars() {
            dot.push_str(&format!(" \"{}_t\" [label=\"{}\"];", node, node));
        }
        dot.push_str(" }\n    subgraph future { rank=same;");
        for node in self.future_nodes.chars() {
            dot.push_str(&format!(" \"{}_t1\" [label=\"{}\"];", node, node));
        }
        dot.push_str(" }\n");
        for edge in best.iter() {
            dot.push_str(&format!(
                "    \"{}_t\" -> \"{}_t1\";\n",
                edge.present, edge.future
            ));
        }
        dot.push_str("}\n");
        Some(dot)
    }
}

/// Best-so-far tracking for one search.
#[derive(Debug, Default)]
struct SearchState {
    best: Option<(Partition, f64)>,
}

impl SearchState {
    fn offer(&mut self, candidate: &Partition, loss: f64) {
        let improves = match &self.best {
            None => !loss.is_nan(),
            Some((_, current)) => loss < *current,
        };
        if improves {
            self.best = Some((candidate.clone(), loss));
        }
    }
}

/// Greedy minimum-loss partition search over one TPM.
#[derive(Debug, Clone)]
pub struct PartitionAnalyzer<'a> {
    present: NodeSet,
    future: NodeSet,
    edges: Vec<Edge>,
    model: LossModel<'a>,
}

impl<'a> PartitionAnalyzer<'a> {
    /// Builds an analyzer for present/future node strings (unordered); both
    /// groups must be non-empty and inside the TPM's scope.
    pub fn new(
        tpm: &'a Tpm,
        present: &str,
        future: &str,
        mode: LossMode,
    ) -> Result<Self, ExecError> {
        let letters = Alphabet::new(MAX_SYSTEM_SIZE)?;
        let present = letters.node_set(present)?;
        let future = letters.node_set(future)?;
        if present.is_empty() || future.is_empty() {
            return Err(ExecError::ValidationError(
                "present and future node groups must not be empty".into(),
            ));
        }
        for node in present.iter().chain(future.iter()) {
            tpm.scope().require(node)?;
        }

        let edges = present
            .iter()
            .flat_map(|p| future.iter().map(move |f| Edge::new(p, f)))
            .collect();
        let model = LossModel::new(tpm, mode, &present, &future)?;

        tracing::info!(
            present = %present,
            future = %future,
            mode = %mode,
            "partition analyzer initialized"
        );
        Ok(Self {
            present,
            future,
            edges,
            model,
        })
    }

    pub fn present_nodes(&self) -> &NodeSet {
        &self.present
    }

    pub fn future_nodes(&self) -> &NodeSet {
        &self.future
    }

    /// Complete bipartite edge set in enumeration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn loss(&self, partition: &Partition) -> Result<f64, ExecError> {
        self.model.loss(partition)
    }

    /// Runs the greedy search to completion.
    pub fn analyze_partitions(&self) -> Result<PartitionReport, ExecError> {
        let start = Instant::now();
        let m = self.edges.len();
        let singles = self
            .edges
            .iter()
            .map(|&e| self.model.loss(&Partition::from_iter([e])))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = SearchState::default();
        let mut used = vec![false; m];
        let mut current = Partition::from_iter([self.edges[0]]);
        used[0] = true;
        let mut sequence = Vec::with_capacity(m + 1);
        sequence.push(Partition::default());
        sequence.push(current.clone());

        for step in 2..=m {
            let remaining: Vec<usize> = (0..m).filter(|&i| !used[i]).collect();
            let diffs = self.score_candidates(&current, &remaining, &singles)?;

            let mut chosen = remaining[0];
            let mut min_diff = f64::INFINITY;
            for (&idx, &diff) in remaining.iter().zip(&diffs) {
                if diff < min_diff {
                    min_diff = diff;
                    chosen = idx;
                }
            }

            used[chosen] = true;
            current.insert(self.edges[chosen]);
            tracing::debug!(
                step,
                edge = %self.edges[chosen],
                diff = min_diff,
                "greedy step"
            );

            if is_valid_partition(&current) {
                let loss = self.model.loss(&current)?;
                state.offer(&current, loss);
            }
            sequence.push(current.clone());
        }

        let execution_time = start.elapsed().as_secs_f64();
        let (best_partition, min_loss) = match state.best {
            Some((p, l)) => (Some(p), Some(l)),
            None => (None, None),
        };
        tracing::info!(
            edges = m,
            min_loss = ?min_loss,
            seconds = execution_time,
            "partition search completed"
        );
        Ok(PartitionReport {
            best_partition,
            min_loss,
            execution_time,
            present_nodes: self.present.to_string(),
            future_nodes: self.future.to_string(),
            sequence,
        })
    }

    /// `loss(current ∪ {e}) - loss({e})` for every remaining edge index.
    fn score_candidates(
        &self,
        current: &Partition,
        remaining: &[usize],
        singles: &[f64],
    ) -> Result<Vec<f64>, ExecError> {
        let score = |&idx: &usize| -> Result<f64, ExecError> {
            let grown = current.with(self.edges[idx]);
            Ok(self.model.loss(&grown)? - singles[idx])
        };
        #[cfg(feature = "parallel")]
        let diffs: Result<Vec<f64>, ExecError> = remaining.par_iter().map(score).collect();
        #[cfg(not(feature = "parallel"))]
        let diffs: Result<Vec<f64>, ExecError> = remaining.iter().map(score).collect();
        diffs
    }
}
