//! Shared fixtures.

use integra_core::{Alphabet, Tpm};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use tempfile::NamedTempFile;

/// Formats rows the way exported matrices look: `[a, b, c],` per line.
pub fn tpm_text(rows: &[Vec<f64>]) -> String {
    rows.iter()
        .map(|row| {
            let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            format!("[{}],", fields.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Full `2^size x size` matrix of uniform values from a fixed seed.
pub fn random_rows(size: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..1usize << size)
        .map(|_| (0..size).map(|_| rng.gen::<f64>()).collect())
        .collect()
}

/// Three nodes where future A copies present A and future B copies
/// present C; column C is a constant 0.5.
pub fn copy_tpm() -> Tpm {
    let rows = (0..8usize)
        .map(|i| vec![((i >> 2) & 1) as f64, (i & 1) as f64, 0.5])
        .collect();
    Tpm::from_rows(Alphabet::new(3).unwrap().full_set(), rows).unwrap()
}
