use crate::common::random_rows;
use integra_core::{Alphabet, ExecError, Tpm, TpmStore};

fn ten_node_store() -> TpmStore {
    let tpm = Tpm::from_rows(Alphabet::new(10).unwrap().full_set(), random_rows(10, 42)).unwrap();
    TpmStore::from_tpm(tpm).unwrap()
}

#[test]
fn marginalize_onto_two_nodes_gives_normalized_four_by_two() {
    let store = ten_node_store();
    let reduced = store.marginalize("AB").unwrap();
    assert_eq!(reduced.shape(), (4, 2));
    for sum in reduced.row_sums() {
        assert!((sum - 1.0).abs() < 1e-12, "row sum {}", sum);
    }
}

#[test]
fn marginalize_onto_seven_nodes() {
    let store = ten_node_store();
    let reduced = store.marginalize("ABCDEFG").unwrap();
    assert_eq!(reduced.shape(), (128, 7));
    assert_eq!(reduced.scope().to_string(), "ABCDEFG");
}

#[test]
fn marginalize_canonicalizes_candidate_order() {
    let store = ten_node_store();
    let scrambled = store.marginalize("JCA").unwrap();
    let sorted = store.marginalize("ACJ").unwrap();
    assert_eq!(scrambled, sorted);
    assert_eq!(scrambled.scope().to_string(), "ACJ");
}

#[test]
fn marginalize_sums_every_source_row_into_its_reduced_state() {
    let rows = random_rows(10, 3);
    let tpm = Tpm::from_rows(Alphabet::new(10).unwrap().full_set(), rows.clone()).unwrap();
    let store = TpmStore::from_tpm(tpm).unwrap();
    let reduced = store.marginalize("J").unwrap();
    assert_eq!(reduced.shape(), (2, 1));
    // one column: normalization makes every non-zero row exactly 1
    assert_eq!(reduced.row(0), &[1.0]);
    assert_eq!(reduced.row(1), &[1.0]);

    let reduced = store.marginalize("AJ").unwrap();
    // reduced state 10: A=1, J=0 collects rows 512, 514, ..., 1022
    let (a, j) = (512..1024)
        .step_by(2)
        .fold((0.0, 0.0), |(a, j), i| (a + rows[i][0], j + rows[i][9]));
    assert!((reduced.get(2, 0) - a / (a + j)).abs() < 1e-9);
    assert!((reduced.get(2, 1) - j / (a + j)).abs() < 1e-9);
}

#[test]
fn marginalize_rejects_letters_outside_alphabet() {
    let store = ten_node_store();
    let err = store.marginalize("ABK").unwrap_err();
    assert!(matches!(err, ExecError::NodeAlphabet { node: 'K', .. }));
    assert!(store.marginalize("A1").is_err());
}
