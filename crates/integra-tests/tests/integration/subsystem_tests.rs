use crate::common::{copy_tpm, random_rows, tpm_text};
use integra_core::{query, ExecError, SubsystemSpec, TpmStore};

#[test]
fn query_on_marginalized_system_reads_encoded_row() {
    let store = TpmStore::parse(&tpm_text(&random_rows(10, 9)), 10).unwrap();
    let reduced = store.marginalize("ABCDEFG").unwrap();
    let result = query("ABt+1|ABCDEFGt=1010000", &reduced).unwrap();
    assert_eq!(result.row_index, 0b1010000);
    assert_eq!(result.slice, reduced.row(0b1010000)[..2].to_vec());
    assert_eq!(result.initial_state, "1010000");
}

#[test]
fn query_on_seven_node_candidate_reads_literal_row() {
    let store = TpmStore::parse(&tpm_text(&random_rows(10, 9)), 10).unwrap();
    let reduced = store.marginalize("ABCDEFG").unwrap();
    let result = query("ABt+1|ABCt=101", &reduced).unwrap();
    assert_eq!(result.row_index, 5);
    assert_eq!(result.slice, reduced.row(5)[..2].to_vec());
    assert_eq!(result.present_nodes, "ABC");
    assert_eq!(result.future_nodes, "AB");
}

#[test]
fn query_result_echoes_specification() {
    let tpm = copy_tpm();
    let result = query("BAt+1|ABCt=101", &tpm).unwrap();
    assert_eq!(result.specification, "BAt+1|ABCt=101");
    assert_eq!(result.present_nodes, "ABC");
    assert_eq!(result.future_nodes, "BA");
    // row 101: future A = present A = 1, future B = present C = 1
    assert_eq!(result.slice, vec![1.0, 1.0]);
}

#[test]
fn query_serializes_to_json() {
    let tpm = copy_tpm();
    let result = query("AB|ABC=100", &tpm).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["initial_state"], "100");
    assert_eq!(value["row_index"], 4);
    assert_eq!(value["slice"], serde_json::json!([1.0, 0.0]));
}

#[test]
fn query_errors_are_classified() {
    let tpm = copy_tpm();
    assert!(matches!(
        query("AB|ABC=1x1", &tpm),
        Err(ExecError::SpecFormat(_))
    ));
    assert!(matches!(
        query("AB ABC=101", &tpm),
        Err(ExecError::SpecFormat(_))
    ));
    assert!(matches!(
        query("AZ|ABC=101", &tpm),
        Err(ExecError::NodeAlphabet { node: 'Z', .. })
    ));
}

#[test]
fn parsed_specification_round_trips_through_display() {
    let spec: SubsystemSpec = "ABt+1|ABCt=011".parse().unwrap();
    assert_eq!(spec.to_string(), "ABt+1|ABCt=011");
    let bare: SubsystemSpec = "AB|ABC=011".parse().unwrap();
    assert_eq!(bare, spec);
}
