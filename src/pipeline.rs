/// Analysis run orchestrator.
///
/// Runs the full sequence: resolve input -> load -> filter -> aggregate ->
/// export tables -> render charts -> write report. Nothing is written until
/// the input has at least one successful row.

use std::path::PathBuf;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};

use crate::charts::{self, CHART_FILE};
use crate::config::Config;
use crate::dataset::{distinct, load_dataset};
use crate::discovery::resolve_input;
use crate::errors::AnalysisError;
use crate::export::{self, COMPARISON_CSV, JSON_SNAPSHOT, SCENARIO_CSV};
use crate::report::{self, REPORT_FILE};
use crate::stats;

const STEPS: u64 = 6;

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub input: PathBuf,
    pub total_records: usize,
    pub successful_records: usize,
    pub artifacts: Vec<PathBuf>,
}

fn step_bar() -> ProgressBar {
    let pb = ProgressBar::new(STEPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Step {pos}/{len}: {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Run one analysis according to `config`.
///
/// Returns `InputNotFound` / `EmptyInput` for the expected operator conditions;
/// callers decide how to present them.
pub fn run(config: &Config) -> Result<RunSummary, AnalysisError> {
    let pb = step_bar();

    pb.set_message("Finding latest CSV file");
    let input = resolve_input(
        config.input.as_deref(),
        &config.search_dir,
        &config.input_pattern,
    )?;
    tracing::info!(path = %input.display(), "Found input");
    println!("✓ Found CSV: {}", input.display());
    pb.inc(1);

    pb.set_message("Loading and cleaning data");
    let dataset = load_dataset(&input)?;
    let successful = dataset.successful();
    tracing::info!(
        records = dataset.len(),
        successful = successful.len(),
        "Dataset loaded"
    );
    println!("✓ Loaded {} records", dataset.len());
    if successful.is_empty() {
        pb.abandon();
        return Err(AnalysisError::EmptyInput {
            path: input.display().to_string(),
        });
    }
    println!(
        "✓ {} successful tests ({:.1}%)",
        successful.len(),
        successful.len() as f64 / dataset.len() as f64 * 100.0
    );
    tracing::info!(
        scenarios = %distinct(&successful, |r| r.scenario.as_str()).join(", "),
        systems = %distinct(&successful, |r| r.system.as_str()).join(", "),
        queries = %distinct(&successful, |r| r.query.as_str()).join(", "),
        "Input contents"
    );
    pb.inc(1);

    pb.set_message("Calculating statistics");
    let analysis = stats::analyze(&successful);
    tracing::info!(
        groups = analysis.per_group.len(),
        comparison_rows = analysis.comparison.rows.len(),
        has_ratio = analysis.comparison.has_ratio,
        "Statistics computed"
    );
    pb.inc(1);

    pb.set_message("Saving analysis results");
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| AnalysisError::io(&config.output_dir, e))?;
    let out = |name: &str| config.output_dir.join(name);
    let mut artifacts = Vec::new();

    let comparison_path = out(COMPARISON_CSV);
    export::write_comparison_csv(&analysis.comparison, &comparison_path)?;
    artifacts.push(comparison_path);

    let scenario_path = out(SCENARIO_CSV);
    export::write_scenario_csv(&analysis.per_scenario, &scenario_path)?;
    artifacts.push(scenario_path);

    let json_path = out(JSON_SNAPSHOT);
    export::write_json_snapshot(&analysis, &json_path)?;
    artifacts.push(json_path);
    pb.inc(1);

    pb.set_message("Generating charts");
    let chart_path = out(CHART_FILE);
    charts::write_chart_sheet(&successful, &analysis, &chart_path)?;
    artifacts.push(chart_path);
    pb.inc(1);

    pb.set_message("Generating text report");
    let text = report::build_report(&dataset, &successful, &analysis, Local::now().naive_local());
    let report_path = out(REPORT_FILE);
    report::write_report(&text, &report_path)?;
    artifacts.push(report_path);
    pb.inc(1);

    pb.finish_with_message("done");
    for path in &artifacts {
        tracing::info!(path = %path.display(), "Saved artifact");
    }

    Ok(RunSummary {
        input,
        total_records: dataset.len(),
        successful_records: successful.len(),
        artifacts,
    })
}
