//! Integration test crate for integra; all tests live under `tests/`.
