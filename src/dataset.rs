/// Benchmark result table types and CSV loading.
///
/// The input is written by the experiment runner with one row per timed query
/// execution. Only the five columns below are read; any others are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AnalysisError;

/// A single timed query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Query")]
    pub query: String,
    /// Canonically "Rapid" or "ChaseGQR"
    #[serde(rename = "System")]
    pub system: String,
    /// NaN when the runner left the cell empty (typically on failure).
    #[serde(rename = "Time_ms", deserialize_with = "deserialize_time")]
    pub time_ms: f64,
    /// Accepts True/False in any case, 1/0 and yes/no.
    #[serde(rename = "Success", deserialize_with = "deserialize_flag")]
    pub success: bool,
}

impl BenchmarkRecord {
    pub fn new(scenario: &str, query: &str, system: &str, time_ms: f64, success: bool) -> Self {
        BenchmarkRecord {
            scenario: scenario.to_string(),
            query: query.to_string(),
            system: system.to_string(),
            time_ms,
            success,
        }
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid Success value '{}'",
            other
        ))),
    }
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
        .map_err(|e| serde::de::Error::custom(format!("invalid Time_ms value '{}': {}", raw, e)))
}

/// Per-system success counts over all loaded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessRate {
    pub successes: usize,
    pub attempts: usize,
}

impl SuccessRate {
    pub fn percent(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64 * 100.0
        }
    }
}

/// Every row of one input file, successful or not.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<BenchmarkRecord>,
}

impl Dataset {
    pub fn new(records: Vec<BenchmarkRecord>) -> Self {
        Dataset { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows with Success = true and a recorded time, in file order.
    pub fn successful(&self) -> Vec<BenchmarkRecord> {
        self.records
            .iter()
            .filter(|r| r.success && !r.time_ms.is_nan())
            .cloned()
            .collect()
    }

    /// Successes over attempts for each system, keyed in system order.
    pub fn success_rates(&self) -> BTreeMap<String, SuccessRate> {
        let mut rates: BTreeMap<String, SuccessRate> = BTreeMap::new();
        for r in &self.records {
            let entry = rates.entry(r.system.clone()).or_insert(SuccessRate {
                successes: 0,
                attempts: 0,
            });
            entry.attempts += 1;
            if r.success {
                entry.successes += 1;
            }
        }
        rates
    }
}

/// Load a benchmark results CSV.
///
/// Fails on the first malformed row, reporting its line number.
pub fn load_dataset(path: &Path) -> Result<Dataset, AnalysisError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AnalysisError::csv(path, e))?;
    read_records(reader, path)
}

fn read_records<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<Dataset, AnalysisError> {
    let mut records = Vec::new();
    for row in reader.deserialize::<BenchmarkRecord>() {
        records.push(row.map_err(|e| AnalysisError::csv(path, e))?);
    }
    Ok(Dataset::new(records))
}

/// Sorted distinct values of one field, for console and report listings.
pub fn distinct<F>(records: &[BenchmarkRecord], field: F) -> Vec<String>
where
    F: Fn(&BenchmarkRecord) -> &str,
{
    let mut values: Vec<String> = records.iter().map(|r| field(r).to_string()).collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Dataset, AnalysisError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        read_records(reader, Path::new("inline.csv"))
    }

    #[test]
    fn test_parses_dotnet_booleans_and_extra_columns() {
        let data = parse(
            "Timestamp,Scenario,Query,System,Time_ms,Success,Error\n\
             2024-01-01,S1,Q1,Rapid,100.5,True,\n\
             2024-01-01,S1,Q1,ChaseGQR,200,False,timeout\n",
        )
        .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.records[0], BenchmarkRecord::new("S1", "Q1", "Rapid", 100.5, true));
        assert!(!data.records[1].success);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let data = parse("Success,Time_ms,System,Query,Scenario\ntrue,7,Rapid,Q2,S9\n").unwrap();
        assert_eq!(data.records[0], BenchmarkRecord::new("S9", "Q2", "Rapid", 7.0, true));
    }

    #[test]
    fn test_bad_time_reports_line() {
        let err = parse(
            "Scenario,Query,System,Time_ms,Success\n\
             S1,Q1,Rapid,10,True\n\
             S1,Q1,Rapid,fast,True\n",
        )
        .unwrap_err();
        match err {
            AnalysisError::Csv { line, path, .. } => {
                assert_eq!(line, 3);
                assert_eq!(path, "inline.csv");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_time_is_kept_but_not_successful() {
        let data = parse(
            "Scenario,Query,System,Time_ms,Success\n\
             S1,Q1,ChaseGQR,,False\n\
             S1,Q1,ChaseGQR,,True\n",
        )
        .unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.records[0].time_ms.is_nan());
        assert!(data.successful().is_empty());
        assert_eq!(data.success_rates()["ChaseGQR"].attempts, 2);
    }

    #[test]
    fn test_invalid_success_flag() {
        let err = parse("Scenario,Query,System,Time_ms,Success\nS1,Q1,Rapid,10,maybe\n");
        assert!(matches!(err, Err(AnalysisError::Csv { .. })));
    }

    #[test]
    fn test_successful_and_rates() {
        let data = Dataset::new(vec![
            BenchmarkRecord::new("S1", "Q1", "Rapid", 10.0, true),
            BenchmarkRecord::new("S1", "Q2", "Rapid", 12.0, false),
            BenchmarkRecord::new("S1", "Q1", "ChaseGQR", 20.0, true),
        ]);
        assert_eq!(data.successful().len(), 2);

        let rates = data.success_rates();
        assert_eq!(rates["Rapid"], SuccessRate { successes: 1, attempts: 2 });
        assert_eq!(rates["ChaseGQR"].percent(), 100.0);
        let systems: Vec<&String> = rates.keys().collect();
        assert_eq!(systems, vec!["ChaseGQR", "Rapid"]);
    }

    #[test]
    fn test_distinct_is_sorted() {
        let records = vec![
            BenchmarkRecord::new("b", "Q1", "Rapid", 1.0, true),
            BenchmarkRecord::new("a", "Q1", "Rapid", 1.0, true),
            BenchmarkRecord::new("b", "Q2", "Rapid", 1.0, true),
        ];
        assert_eq!(distinct(&records, |r| r.scenario.as_str()), vec!["a", "b"]);
    }
}
