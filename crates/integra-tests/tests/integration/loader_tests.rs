use crate::common::{random_rows, tpm_text, write_temp};
use integra_core::{ExecError, TpmStore};

#[test]
fn load_reads_full_ten_node_file() {
    let rows = random_rows(10, 1);
    let file = write_temp(&tpm_text(&rows));
    let store = TpmStore::load(file.path(), 10).unwrap();
    assert_eq!(store.full_tpm().shape(), (1024, 10));
    assert_eq!(store.report().accepted, 1024);
    assert!(store.report().rejected.is_empty());
    assert_eq!(store.full_tpm().row(17), rows[17].as_slice());
}

#[test]
fn load_rejects_each_malformed_row_once() {
    let good = vec![0.1; 10];
    let text = [
        tpm_text(&[good.clone()]),
        "[0.1, 0.2, 0.3],".to_string(),
        tpm_text(&[good.clone()]),
        tpm_text(&[vec![0.5; 12]]),
    ]
    .join("\n");
    let file = write_temp(&text);
    let store = TpmStore::load(file.path(), 10).unwrap();

    assert_eq!(store.full_tpm().rows(), 2);
    let rejected = &store.report().rejected;
    assert_eq!(rejected.len(), 2);
    assert_eq!((rejected[0].line, rejected[0].fields), (2, 3));
    assert_eq!((rejected[1].line, rejected[1].fields), (4, 12));
    assert!(rejected.iter().all(|r| r.expected == 10));
}

#[test]
fn load_keeps_rows_after_dropping_bad_tokens() {
    // "x" is dropped, leaving exactly three numbers
    let file = write_temp("0.2, x, 0.3, 0.5\n1, 0, 0\n");
    let store = TpmStore::load(file.path(), 3).unwrap();
    assert_eq!(store.full_tpm().row(0), &[0.2, 0.3, 0.5]);
    assert_eq!(store.report().dropped_tokens.len(), 1);
    assert_eq!(store.report().dropped_tokens[0].line, 1);
}

#[test]
fn load_fails_on_file_without_valid_rows() {
    let file = write_temp("header, line\n\n");
    let err = TpmStore::load(file.path(), 10).unwrap_err();
    assert!(matches!(err, ExecError::DataFormat(_)));
}

#[test]
fn load_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = TpmStore::load(dir.path().join("missing.csv"), 10).unwrap_err();
    assert!(matches!(err, ExecError::Io { .. }));
    assert!(err.to_string().contains("missing.csv"));
}

#[test]
fn load_rejects_unsupported_system_size() {
    let file = write_temp("1, 0\n");
    assert!(matches!(
        TpmStore::load(file.path(), 0),
        Err(ExecError::ValidationError(_))
    ));
    assert!(matches!(
        TpmStore::load(file.path(), 27),
        Err(ExecError::ValidationError(_))
    ));
}
