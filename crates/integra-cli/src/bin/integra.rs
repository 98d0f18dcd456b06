//! Integra CLI - analyze transition probability matrices from the command line
//!
//! Usage:
//!   integra <file>                                   # Load and report the TPM
//!   integra <file> --candidate ABCDEFG               # Marginalize onto a node subset
//!   integra <file> --subsystem "ABt+1|ABCt=101"      # Query conditional slices
//!   integra <file> --present ABC --future AB -o json # Search partitions, JSON output

use clap::Parser;
use integra_core::{
    query, AnalysisConfig, ExecError, LossMode, PartitionAnalyzer, PartitionReport,
    SubsystemResult, Tpm, TpmStore,
};
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "integra")]
#[command(version)]
#[command(about = "Integra - TPM marginalization, subsystem queries and partition search")]
struct Cli {
    /// Input TPM file (one comma-separated row per line)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Nodes in the full system (overrides the configuration file)
    #[arg(long, value_name = "N")]
    system_size: Option<usize>,

    /// Node subset to marginalize onto (default: every node)
    #[arg(short, long, value_name = "NODES")]
    candidate: Option<String>,

    /// Subsystem query such as "ABt+1|ABCt=101"; may be repeated
    #[arg(short, long = "subsystem", value_name = "SPEC")]
    subsystems: Vec<String>,

    /// Present node group for the partition search
    #[arg(long, value_name = "NODES")]
    present: Option<String>,

    /// Future node group for the partition search
    #[arg(long, value_name = "NODES")]
    future: Option<String>,

    /// Loss mode: structural or constant
    #[arg(long, value_name = "MODE")]
    loss: Option<LossMode>,

    /// TOML analysis configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: summary or json
    #[arg(short, long, default_value = "summary", value_name = "FORMAT")]
    output: String,

    /// Write the best partition as a Graphviz DOT document
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Append log events to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref());

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(log_file: Option<&Path>) {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => match File::options().create(true).append(true).open(path) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init(),
            Err(e) => {
                eprintln!("Cannot open log file '{}': {}", path.display(), e);
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(std::io::stderr)
                    .init();
            }
        },
        None => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// Configuration file values with command-line flags layered on top.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig, ExecError> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(size) = cli.system_size {
        config.system_size = size;
    }
    if let Some(mode) = cli.loss {
        config.loss_mode = mode;
    }
    if cli.candidate.is_some() {
        config.candidate = cli.candidate.clone();
    }
    if cli.present.is_some() {
        config.present = cli.present.clone();
    }
    if cli.future.is_some() {
        config.future = cli.future.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), ExecError> {
    let config = resolve_config(cli)?;
    let store = TpmStore::load(&cli.file, config.system_size)?;
    let candidate = config.candidate_nodes()?;
    let reduced = store.marginalize(&candidate)?;

    let mut results = Vec::new();
    for spec in &cli.subsystems {
        match query(spec, &reduced) {
            Ok(result) => results.push(result),
            Err(e) => eprintln!("Query '{}' failed: {}", spec, e),
        }
    }

    let report = match (&config.present, &config.future) {
        (Some(present), Some(future)) => Some(
            PartitionAnalyzer::new(&reduced, present, future, config.loss_mode)?
                .analyze_partitions()?,
        ),
        (None, None) => None,
        _ => {
            return Err(ExecError::ValidationError(
                "--present and --future must be given together".into(),
            ))
        }
    };

    if let (Some(path), Some(report)) = (&cli.dot, &report) {
        write_dot(path, report)?;
    }

    match cli.output.as_str() {
        "json" => {
            let output = json!({
                "file": cli.file.display().to_string(),
                "rows_loaded": store.report().accepted,
                "rows_rejected": store.report().rejected.len(),
                "candidate": reduced.scope().to_string(),
                "shape": [reduced.rows(), reduced.cols()],
                "subsystems": results,
                "partition": report,
            });
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error serializing to JSON: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => print_summary(&store, &reduced, &results, report.as_ref()),
    }
    Ok(())
}

fn print_summary(
    store: &TpmStore,
    reduced: &Tpm,
    results: &[SubsystemResult],
    report: Option<&PartitionReport>,
) {
    let load = store.report();
    println!(
        "Loaded {} rows over {} nodes ({} rejected)",
        load.accepted,
        store.system_size(),
        load.rejected.len()
    );
    println!(
        "Marginalized onto {}: {} x {}",
        reduced.scope(),
        reduced.rows(),
        reduced.cols()
    );

    for result in results {
        println!("\nSubsystem {}", result.specification);
        println!("  present nodes: {}", result.present_nodes);
        println!("  future nodes:  {}", result.future_nodes);
        println!("  initial state: {}", result.initial_state);
        let values: Vec<String> = result.slice.iter().map(|v| format!("{:.6}", v)).collect();
        println!("  slice:         [{}]", values.join(", "));
    }

    if let Some(report) = report {
        println!(
            "\nPartition search {} -> {}",
            report.present_nodes, report.future_nodes
        );
        match (&report.best_partition, report.min_loss) {
            (Some(best), Some(loss)) => {
                println!("  best partition: {}", best);
                println!("  min loss:       {:.6}", loss);
            }
            _ => println!("  no valid partition found"),
        }
        println!("  execution time: {:.6}s", report.execution_time);
    }
}

fn write_dot(path: &Path, report: &PartitionReport) -> Result<(), ExecError> {
    let Some(dot) = report.to_dot() else {
        tracing::warn!("no partition found, skipping {}", path.display());
        return Ok(());
    };
    std::fs::write(path, dot).map_err(|source| ExecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("partition written to {}", path.display());
    Ok(())
}
