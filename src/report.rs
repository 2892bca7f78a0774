/// Text report for a Rapid vs ChaseGQR comparison run.
///
/// `build_report` is pure: given the same inputs and timestamp it produces the
/// same text. Sections that depend on both canonical systems being present are
/// left out when that does not hold.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::dataset::{distinct, BenchmarkRecord, Dataset};
use crate::errors::AnalysisError;
use crate::stats::{Analysis, Summary, CHASE, CHASE_WINS_ABOVE, RAPID, RAPID_WINS_BELOW};

pub const REPORT_FILE: &str = "FINAL_REPORT.txt";

const RULE_WIDTH: usize = 80;

/// Averages and spreads of the two canonical systems, when exactly those two ran.
struct HeadToHead {
    rapid: Summary,
    chase: Summary,
}

impl HeadToHead {
    fn from_analysis(analysis: &Analysis) -> Option<Self> {
        if analysis.global.len() != 2 {
            return None;
        }
        Some(HeadToHead {
            rapid: *analysis.global_for(RAPID)?,
            chase: *analysis.global_for(CHASE)?,
        })
    }

    fn rapid_faster(&self) -> bool {
        self.rapid.avg < self.chase.avg
    }

    fn rapid_steadier(&self) -> bool {
        self.rapid.std < self.chase.std
    }

    fn speed_line(&self) -> String {
        let (r, c) = (self.rapid.avg, self.chase.avg);
        if self.rapid_faster() {
            format!("  * {} is {:.1}% faster overall", RAPID, (c - r) / c * 100.0)
        } else {
            format!("  * {} is {:.1}% faster overall", CHASE, (r - c) / r * 100.0)
        }
    }

    /// None when either spread is undefined (a single sample).
    fn stability_line(&self) -> Option<String> {
        let (r, c) = (self.rapid.std, self.chase.std);
        if r.is_nan() || c.is_nan() {
            return None;
        }
        let line = if self.rapid_steadier() {
            let ratio = if r > 0.0 { c / r } else { f64::INFINITY };
            format!("  * {RAPID} is {ratio:.1}x more stable (std: {r:.0} vs {c:.0})")
        } else {
            let ratio = if c > 0.0 { r / c } else { f64::INFINITY };
            format!("  * {CHASE} is {ratio:.1}x more stable (std: {c:.0} vs {r:.0})")
        };
        Some(line)
    }

    fn recommendation(&self) -> &'static str {
        match (self.rapid_faster(), self.rapid_steadier()) {
            (true, true) => "  Recommended: Rapid (faster and more stable)",
            (true, false) => "  Recommended: Rapid (faster performance)",
            (false, true) => "  Recommended: Rapid (better stability)",
            (false, false) => "  Recommended: Choose based on specific scenario and query type",
        }
    }
}

/// Assemble the report text.
///
/// `successful` is the filtered record set the analysis was computed from;
/// `dataset` is the full load, used only for success rates.
pub fn build_report(
    dataset: &Dataset,
    successful: &[BenchmarkRecord],
    analysis: &Analysis,
    generated_at: NaiveDateTime,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    lines.push(rule.clone());
    lines.push(format!("{RAPID} vs {CHASE} Performance Comparison Report"));
    lines.push(format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")));
    lines.push(rule.clone());
    lines.push(String::new());

    let scenarios = distinct(successful, |r| r.scenario.as_str());
    let queries = distinct(successful, |r| r.query.as_str());
    let systems = distinct(successful, |r| r.system.as_str());

    lines.push("[Experiment Configuration]".into());
    lines.push(format!("  Scenarios: {}", scenarios.join(", ")));
    lines.push(format!("  Queries: {}", queries.len()));
    lines.push(format!("  Systems: {}", systems.join(", ")));
    lines.push(format!("  Total Tests: {}", successful.len()));
    lines.push(String::new());

    lines.push("[Test Success Rate]".into());
    for (system, rate) in dataset.success_rates() {
        lines.push(format!(
            "  {}: {}/{} ({:.0}%)",
            system,
            rate.successes,
            rate.attempts,
            rate.percent()
        ));
    }
    lines.push(String::new());

    lines.push("[Overall Performance]".into());
    for row in &analysis.global {
        let s = &row.summary;
        lines.push(format!("  {}:", row.system));
        lines.push(format!("    Average: {:.1} ms", s.avg));
        lines.push(format!("    Std Dev: {:.1} ms", s.std));
        lines.push(format!("    Range: {:.0} - {:.0} ms", s.min, s.max));
        lines.push(format!("    Tests: {}", s.count));
    }
    let head_to_head = HeadToHead::from_analysis(analysis);
    if let Some(h2h) = &head_to_head {
        lines.push(String::new());
        lines.push(h2h.speed_line());
        if let Some(line) = h2h.stability_line() {
            lines.push(line);
        }
    }
    lines.push(String::new());

    lines.push("[Performance by Scenario]".into());
    for scenario in &scenarios {
        lines.push(String::new());
        lines.push(format!("  {scenario}:"));
        for row in analysis.per_scenario.iter().filter(|r| &r.scenario == scenario) {
            lines.push(format!("    {}: {:.1} ms (std: {:.1})", row.system, row.avg, row.std));
        }
    }
    lines.push(String::new());

    lines.push("[Key Findings]".into());
    let comparison = &analysis.comparison;
    if let Some(m) = comparison.mean_ratio().filter(|_| comparison.has_ratio) {
        if m > CHASE_WINS_ABOVE {
            lines.push(format!("  - {CHASE} is on average {:.1}% faster", (m - 1.0) * 100.0));
        } else if m < RAPID_WINS_BELOW {
            lines.push(format!("  - {RAPID} is on average {:.1}% faster", (1.0 / m - 1.0) * 100.0));
        } else {
            lines.push(format!("  - Both systems have similar performance (ratio: {m:.2})"));
        }
        for (winner, count) in comparison.win_counts() {
            lines.push(format!("  - {winner} wins: {count} queries"));
        }
    }
    lines.push(String::new());

    lines.push("[Recommendations]".into());
    if let Some(h2h) = &head_to_head {
        lines.push(h2h.recommendation().into());
    }
    lines.push("  - For simple queries: Choose system with better average performance".into());
    lines.push("  - For complex queries: Choose system with better stability".into());
    lines.push("  - For production: Consider both performance and stability".into());
    lines.push(String::new());
    lines.push(rule);

    lines.join("\n")
}

pub fn write_report(text: &str, path: &Path) -> Result<(), AnalysisError> {
    std::fs::write(path, text).map_err(|e| AnalysisError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::analyze;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    fn build(records: Vec<BenchmarkRecord>) -> String {
        let dataset = Dataset::new(records);
        let successful = dataset.successful();
        let analysis = analyze(&successful);
        build_report(&dataset, &successful, &analysis, timestamp())
    }

    #[test]
    fn test_worked_example_report() {
        let report = build(vec![
            BenchmarkRecord::new("S1", "Q1", RAPID, 100.0, true),
            BenchmarkRecord::new("S1", "Q1", RAPID, 120.0, true),
            BenchmarkRecord::new("S1", "Q1", CHASE, 150.0, true),
            BenchmarkRecord::new("S1", "Q1", CHASE, 900.0, false),
        ]);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "Rapid vs ChaseGQR Performance Comparison Report");
        assert_eq!(lines[2], "Generated: 2024-03-15 12:30:00");

        assert!(lines.contains(&"  Systems: ChaseGQR, Rapid"));
        assert!(lines.contains(&"  Total Tests: 3"));
        assert!(lines.contains(&"  ChaseGQR: 1/2 (50%)"));
        assert!(lines.contains(&"  Rapid: 2/2 (100%)"));
        assert!(lines.contains(&"    Average: 110.0 ms"));
        assert!(lines.contains(&"    Std Dev: 14.1 ms"));
        assert!(lines.contains(&"    Range: 100 - 120 ms"));
        assert!(lines.contains(&"  * Rapid is 26.7% faster overall"));
        // ChaseGQR has a single sample, so spreads cannot be compared
        assert!(!report.contains("more stable"));
        assert!(lines.contains(&"    Rapid: 110.0 ms (std: 14.1)"));
        assert!(lines.contains(&"  - ChaseGQR is on average 36.4% faster"));
        assert!(lines.contains(&"  - Chase wins: 1 queries"));
        assert!(lines.contains(&"  Recommended: Rapid (faster performance)"));
    }

    #[test]
    fn test_stability_and_similar_ratio() {
        let report = build(vec![
            BenchmarkRecord::new("S1", "Q1", RAPID, 100.0, true),
            BenchmarkRecord::new("S1", "Q1", RAPID, 102.0, true),
            BenchmarkRecord::new("S1", "Q1", CHASE, 90.0, true),
            BenchmarkRecord::new("S1", "Q1", CHASE, 110.0, true),
        ]);
        assert!(report.contains("  * ChaseGQR is 1.0% faster overall"));
        assert!(report.contains("  * Rapid is 10.0x more stable (std: 1 vs 14)"));
        assert!(report.contains("  - Both systems have similar performance (ratio: 0.99)"));
        assert!(report.contains("  - Tie wins: 1 queries"));
        assert!(report.contains("  Recommended: Rapid (better stability)"));
    }

    #[test]
    fn test_single_system_omits_comparisons() {
        let report = build(vec![
            BenchmarkRecord::new("S1", "Q1", RAPID, 10.0, true),
            BenchmarkRecord::new("S2", "Q2", RAPID, 30.0, true),
        ]);
        assert!(!report.contains("faster"));
        assert!(!report.contains("Recommended:"));
        assert!(!report.contains("wins:"));
        assert!(report.contains("[Key Findings]"));
        assert!(report.contains("  - For production: Consider both performance and stability"));
        assert!(report.contains("  S2:"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let records = vec![
            BenchmarkRecord::new("S1", "Q1", RAPID, 10.0, true),
            BenchmarkRecord::new("S1", "Q1", CHASE, 8.0, true),
        ];
        assert_eq!(build(records.clone()), build(records));
    }
}
