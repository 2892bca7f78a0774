/// Persists derived tables for downstream tooling.
///
/// CSV files carry a UTF-8 byte-order mark so spreadsheet applications pick the
/// right encoding. Undefined values (missing pivot cells, NaN std) are written
/// as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::errors::AnalysisError;
use crate::stats::{Analysis, ComparisonTable, ScenarioSummary};

pub const COMPARISON_CSV: &str = "performance_comparison.csv";
pub const SCENARIO_CSV: &str = "detailed_statistics.csv";
pub const JSON_SNAPSHOT: &str = "analysis_summary.json";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

/// Render the comparison table as CSV into any writer.
pub fn comparison_to_writer<W: Write>(
    table: &ComparisonTable,
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Scenario".to_string(), "Query".to_string()];
    header.extend(table.systems.iter().cloned());
    if table.has_ratio {
        header.push("SpeedRatio".to_string());
        header.push("Winner".to_string());
    }
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.scenario.clone(), row.query.clone()];
        for system in &table.systems {
            record.push(cell(row.averages.get(system).copied()));
        }
        if table.has_ratio {
            record.push(cell(row.speed_ratio));
            record.push(row.winner.map(|w| w.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the per-scenario table as CSV into any writer.
pub fn scenarios_to_writer<W: Write>(
    rows: &[ScenarioSummary],
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Scenario", "System", "avg", "std"])?;
    for row in rows {
        writer.write_record([
            row.scenario.clone(),
            row.system.clone(),
            cell(Some(row.avg)),
            cell(Some(row.std)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn create_with_bom(path: &Path) -> Result<File, AnalysisError> {
    let mut file = File::create(path).map_err(|e| AnalysisError::io(path, e))?;
    file.write_all(UTF8_BOM).map_err(|e| AnalysisError::io(path, e))?;
    Ok(file)
}

pub fn write_comparison_csv(table: &ComparisonTable, path: &Path) -> Result<(), AnalysisError> {
    let file = create_with_bom(path)?;
    comparison_to_writer(table, file).map_err(|e| AnalysisError::io(path, e))
}

pub fn write_scenario_csv(rows: &[ScenarioSummary], path: &Path) -> Result<(), AnalysisError> {
    let file = create_with_bom(path)?;
    scenarios_to_writer(rows, file).map_err(|e| AnalysisError::io(path, e))
}

/// Save all four tables as pretty JSON. Non-finite numbers serialize as null.
pub fn write_json_snapshot(analysis: &Analysis, path: &Path) -> Result<(), AnalysisError> {
    let json = serde_json::to_string_pretty(analysis).map_err(|e| AnalysisError::io(path, e))?;
    std::fs::write(path, json).map_err(|e| AnalysisError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::BenchmarkRecord;
    use crate::stats::analyze;

    fn render_comparison(table: &ComparisonTable) -> String {
        let mut buf = Vec::new();
        comparison_to_writer(table, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_comparison_with_ratio() {
        let records = vec![
            BenchmarkRecord::new("S1", "Q1", "Rapid", 100.0, true),
            BenchmarkRecord::new("S1", "Q1", "ChaseGQR", 250.0, true),
            BenchmarkRecord::new("S1", "Q2", "Rapid", 40.0, true),
        ];
        let csv = render_comparison(&analyze(&records).comparison);
        assert_eq!(
            csv,
            "Scenario,Query,ChaseGQR,Rapid,SpeedRatio,Winner\n\
             S1,Q1,250,100,2.5,Chase\n\
             S1,Q2,,40,,\n"
        );
    }

    #[test]
    fn test_comparison_without_ratio_columns() {
        let records = vec![BenchmarkRecord::new("S1", "Q1", "Rapid", 12.5, true)];
        let csv = render_comparison(&analyze(&records).comparison);
        assert_eq!(csv, "Scenario,Query,Rapid\nS1,Q1,12.5\n");
    }

    #[test]
    fn test_scenario_csv_blank_nan_std() {
        let records = vec![
            BenchmarkRecord::new("S1", "Q1", "Rapid", 10.0, true),
            BenchmarkRecord::new("S1", "Q2", "Rapid", 20.0, true),
            BenchmarkRecord::new("S2", "Q1", "Rapid", 5.0, true),
        ];
        let mut buf = Vec::new();
        scenarios_to_writer(&analyze(&records).per_scenario, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Scenario,System,avg,std");
        assert!(lines[1].starts_with("S1,Rapid,15,7.07"));
        assert_eq!(lines[2], "S2,Rapid,5,");
    }

    #[test]
    fn test_files_start_with_bom_and_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            BenchmarkRecord::new("S1", "Q1", "Rapid", 100.0, true),
            BenchmarkRecord::new("S1", "Q1", "Rapid", 120.0, true),
            BenchmarkRecord::new("S1", "Q1", "ChaseGQR", 150.0, true),
        ];
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        write_comparison_csv(&analyze(&records).comparison, &first).unwrap();
        write_comparison_csv(&analyze(&records).comparison, &second).unwrap();

        let a = std::fs::read(&first).unwrap();
        let b = std::fs::read(&second).unwrap();
        assert!(a.starts_with(UTF8_BOM));
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_snapshot_nulls_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JSON_SNAPSHOT);
        let records = vec![BenchmarkRecord::new("S1", "Q1", "Rapid", 1.0, true)];
        write_json_snapshot(&analyze(&records), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["global"][0]["std"].is_null());
        assert_eq!(value["global"][0]["count"], 1);
        assert_eq!(value["comparison"]["has_ratio"], false);
    }
}
