//! The analysis engine for transition probability matrices.
//!
//! This module provides:
//! - **errors**: Error types for loading, querying and searching
//! - **alphabet**: Node alphabet and canonical node sets
//! - **state_codec**: Joint-state bitstring <-> index conversion
//! - **tpm**: Matrix type and tolerant text loader
//! - **marginalize**: Projection of a TPM onto a node subset
//! - **subsystem**: Conditional slice queries (`ABt+1|ABCt=101`)
//! - **loss**: Partition loss modes and earth-mover distances
//! - **partition**: Greedy minimum-loss partition search

pub mod alphabet;
pub mod errors;
pub mod loss;
pub mod marginalize;
pub mod partition;
pub mod state_codec;
pub mod subsystem;
pub mod tpm;
