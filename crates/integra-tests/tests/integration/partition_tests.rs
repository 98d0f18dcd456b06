use crate::common::{copy_tpm, random_rows};
use integra_core::engine::partition::is_valid_partition;
use integra_core::{Alphabet, Edge, ExecError, LossMode, PartitionAnalyzer, Tpm, TpmStore};

#[test]
fn structural_search_finds_copying_edges() {
    let tpm = copy_tpm();
    let analyzer = PartitionAnalyzer::new(&tpm, "ABC", "AB", LossMode::Structural).unwrap();
    let report = analyzer.analyze_partitions().unwrap();

    assert_eq!(report.min_loss, Some(0.0));
    let best = report.best_partition.unwrap();
    assert!(best.contains(&Edge::new('A', 'A')));
    assert!(best.contains(&Edge::new('C', 'B')));
    assert_eq!(report.present_nodes, "ABC");
    assert_eq!(report.future_nodes, "AB");
}

#[test]
fn sequence_is_a_chain_of_growing_edge_sets() {
    let tpm = copy_tpm();
    let analyzer = PartitionAnalyzer::new(&tpm, "ABC", "AB", LossMode::Structural).unwrap();
    let report = analyzer.analyze_partitions().unwrap();
    let m = analyzer.edges().len();

    assert_eq!(report.sequence.len(), m + 1);
    assert!(report.sequence[0].is_empty());
    assert_eq!(report.sequence[1].edges(), vec![analyzer.edges()[0]]);
    for (i, w) in report.sequence.iter().enumerate() {
        assert_eq!(w.len(), i);
        assert!(is_valid_partition(w));
        if i > 0 {
            assert!(report.sequence[i - 1].is_subset(w));
        }
    }
    assert_eq!(report.sequence[m].len(), 6);
}

#[test]
fn min_loss_is_smallest_scored_step() {
    let tpm = Tpm::from_rows(Alphabet::new(10).unwrap().full_set(), random_rows(10, 5)).unwrap();
    let store = TpmStore::from_tpm(tpm).unwrap();
    let reduced = store.marginalize("ABC").unwrap();
    let analyzer = PartitionAnalyzer::new(&reduced, "ABC", "AB", LossMode::Structural).unwrap();
    let report = analyzer.analyze_partitions().unwrap();

    let losses: Vec<f64> = report.sequence[2..]
        .iter()
        .map(|w| analyzer.loss(w).unwrap())
        .collect();
    let smallest = losses.iter().cloned().fold(f64::INFINITY, f64::min);
    assert_eq!(report.min_loss, Some(smallest));

    let best = report.best_partition.unwrap();
    let first_at_min = losses.iter().position(|&l| l == smallest).unwrap() + 2;
    assert_eq!(best, report.sequence[first_at_min]);
}

#[test]
fn constant_mode_keeps_first_scored_step() {
    let tpm = copy_tpm();
    let analyzer = PartitionAnalyzer::new(&tpm, "ABC", "AB", LossMode::Constant).unwrap();
    let report = analyzer.analyze_partitions().unwrap();
    // every edge set scores the mean entry, so the first scored step wins
    let min_loss = report.min_loss.unwrap();
    assert!((min_loss - 0.5).abs() < 1e-12);
    assert_eq!(report.best_partition.unwrap(), report.sequence[2]);
}

#[test]
fn single_edge_search_reports_nothing() {
    let tpm = copy_tpm();
    let analyzer = PartitionAnalyzer::new(&tpm, "B", "C", LossMode::Structural).unwrap();
    let report = analyzer.analyze_partitions().unwrap();
    assert_eq!(report.best_partition, None);
    assert_eq!(report.min_loss, None);
    assert_eq!(report.sequence.len(), 2);
}

#[test]
fn repeated_searches_agree() {
    let tpm = copy_tpm();
    let analyzer = PartitionAnalyzer::new(&tpm, "AC", "AB", LossMode::Structural).unwrap();
    let first = analyzer.analyze_partitions().unwrap();
    let second = analyzer.analyze_partitions().unwrap();
    assert_eq!(first.sequence, second.sequence);
    assert_eq!(first.best_partition, second.best_partition);
    assert_eq!(first.min_loss, second.min_loss);
}

#[test]
fn analyzer_rejects_groups_outside_scope() {
    let tpm = copy_tpm();
    assert!(matches!(
        PartitionAnalyzer::new(&tpm, "AD", "AB", LossMode::Structural),
        Err(ExecError::NodeAlphabet { node: 'D', .. })
    ));
    assert!(matches!(
        PartitionAnalyzer::new(&tpm, "", "AB", LossMode::Structural),
        Err(ExecError::ValidationError(_))
    ));
}

#[test]
fn report_serializes_edges_as_objects() {
    let tpm = copy_tpm();
    let analyzer = PartitionAnalyzer::new(&tpm, "ABC", "AB", LossMode::Structural).unwrap();
    let report = analyzer.analyze_partitions().unwrap();
    let value = serde_json::to_value(&report).unwrap();

    let best = value["best_partition"].as_array().unwrap();
    assert_eq!(best.len(), report.best_partition.as_ref().unwrap().len());
    assert!(best
        .iter()
        .any(|e| e["present"] == "A" && e["future"] == "A"));
    assert_eq!(value["sequence"].as_array().unwrap().len(), 7);
    assert_eq!(value["min_loss"], 0.0);
}
