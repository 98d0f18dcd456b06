//! # Integra Core
//!
//! Marginalization, conditional queries and minimum-loss partition search
//! over transition probability matrices of binary-node systems.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use integra_core::{LossMode, PartitionAnalyzer, TpmStore};
//!
//! let store = TpmStore::load("system.csv", 10)?;
//! let reduced = store.marginalize("ABCDEFG")?;
//! let slice = integra_core::query("ABt+1|ABCt=101", &reduced)?;
//! let report = PartitionAnalyzer::new(&reduced, "ABC", "AB", LossMode::Structural)?
//!     .analyze_partitions()?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use engine::alphabet::{Alphabet, NodeSet};
pub use engine::errors::ExecError;
pub use engine::loss::LossMode;
pub use engine::marginalize::marginalize;
pub use engine::partition::{Edge, Partition, PartitionAnalyzer, PartitionReport};
pub use engine::subsystem::{query, SubsystemResult, SubsystemSpec};
pub use engine::tpm::{LoadReport, Tpm, TpmStore};
