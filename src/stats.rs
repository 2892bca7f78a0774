/// Statistics aggregation over successful benchmark records.
///
/// Produces four derived tables from one pass over the input:
///   1. per (scenario, query, system) summaries
///   2. a comparison table pivoted on system, with speed ratio and winner
///   3. global per-system summaries
///   4. per (scenario, system) avg/std
///
/// All functions are pure. Every table is ordered by its grouping key so that
/// repeated runs over the same input produce identical output.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::dataset::BenchmarkRecord;

/// Baseline system: the ratio denominator.
pub const RAPID: &str = "Rapid";
/// Compared system: the ratio numerator.
pub const CHASE: &str = "ChaseGQR";

/// Ratio above which ChaseGQR's average is called out as the winner.
pub const CHASE_WINS_ABOVE: f64 = 1.1;
/// Ratio below which Rapid's average is called out as the winner.
pub const RAPID_WINS_BELOW: f64 = 0.9;

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// avg/std/min/max/count of Time_ms over one group.
///
/// `std` is the sample (N-1) standard deviation and is NaN for a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub avg: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Summary {
    /// Returns None for an empty slice; empty groups are never emitted.
    pub fn from_samples(samples: &[f64]) -> Option<Summary> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Rounding in sum/len can land just outside [min, max]
        let avg = mean(samples).clamp(min, max);
        let std = if count < 2 {
            f64::NAN
        } else if min == max {
            0.0
        } else {
            let ss: f64 = samples.iter().map(|x| (x - avg).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };
        Some(Summary { avg, std, min, max, count })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Lower quartile, median and upper quartile using linear interpolation
/// between order statistics. Returns None for an empty slice.
pub fn quartiles(samples: &[f64]) -> Option<(f64, f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let at = |q: f64| {
        let pos = q * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    };
    Some((at(0.25), at(0.5), at(0.75)))
}

// ---------------------------------------------------------------------------
// Derived table rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub scenario: String,
    pub query: String,
    pub system: String,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSummary {
    pub system: String,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Per-scenario granularity only carries avg and std.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub system: String,
    pub avg: f64,
    pub std: f64,
}

/// Three-way verdict for one (scenario, query) comparison row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Winner {
    Chase,
    Rapid,
    Tie,
}

impl Winner {
    /// Both thresholds are exclusive: exactly 1.1 and exactly 0.9 are ties.
    pub fn from_ratio(ratio: f64) -> Winner {
        if ratio > CHASE_WINS_ABOVE {
            Winner::Chase
        } else if ratio < RAPID_WINS_BELOW {
            Winner::Rapid
        } else {
            Winner::Tie
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Winner::Chase => "Chase",
            Winner::Rapid => "Rapid",
            Winner::Tie => "Tie",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One (scenario, query) row of the pivot.
///
/// `averages` only holds systems that actually ran this query in this scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub scenario: String,
    pub query: String,
    pub averages: BTreeMap<String, f64>,
    pub speed_ratio: Option<f64>,
    pub winner: Option<Winner>,
}

/// The pivoted comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    /// Distinct systems, sorted; one pivot column each.
    pub systems: Vec<String>,
    /// True when both canonical systems are columns and SpeedRatio/Winner exist.
    pub has_ratio: bool,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Defined speed ratios in row order.
    pub fn ratios(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.speed_ratio).collect()
    }

    /// Mean of the defined ratios, or None when there are none.
    pub fn mean_ratio(&self) -> Option<f64> {
        let ratios = self.ratios();
        if ratios.is_empty() {
            None
        } else {
            Some(mean(&ratios))
        }
    }

    /// Winner counts, most frequent first (label order breaks ties).
    pub fn win_counts(&self) -> Vec<(Winner, usize)> {
        let mut counts: BTreeMap<Winner, usize> = BTreeMap::new();
        for w in self.rows.iter().filter_map(|r| r.winner) {
            *counts.entry(w).or_insert(0) += 1;
        }
        let mut counts: Vec<(Winner, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label().cmp(b.0.label())));
        counts
    }
}

/// The four derived tables for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub per_group: Vec<GroupSummary>,
    pub comparison: ComparisonTable,
    pub global: Vec<SystemSummary>,
    pub per_scenario: Vec<ScenarioSummary>,
}

impl Analysis {
    pub fn global_for(&self, system: &str) -> Option<&Summary> {
        self.global
            .iter()
            .find(|s| s.system == system)
            .map(|s| &s.summary)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute all derived tables. Never fails; an empty input yields empty tables
/// and a comparison table without ratio columns.
pub fn analyze(records: &[BenchmarkRecord]) -> Analysis {
    let per_group = summarize_groups(records);
    let comparison = pivot(&per_group);
    let global = summarize_systems(records);
    let per_scenario = summarize_scenarios(records);
    Analysis { per_group, comparison, global, per_scenario }
}

/// Group samples by an ordered key. BTreeMap gives deterministic key order.
fn group_by<K, F>(records: &[BenchmarkRecord], key: F) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    F: Fn(&BenchmarkRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for r in records {
        groups.entry(key(r)).or_default().push(r.time_ms);
    }
    groups
}

pub fn summarize_groups(records: &[BenchmarkRecord]) -> Vec<GroupSummary> {
    group_by(records, |r| (r.scenario.clone(), r.query.clone(), r.system.clone()))
        .into_iter()
        .filter_map(|((scenario, query, system), samples)| {
            Summary::from_samples(&samples).map(|summary| GroupSummary {
                scenario,
                query,
                system,
                summary,
            })
        })
        .collect()
}

/// Pivot per-group averages into one row per (scenario, query).
pub fn pivot(per_group: &[GroupSummary]) -> ComparisonTable {
    let mut systems: Vec<String> = per_group.iter().map(|g| g.system.clone()).collect();
    systems.sort();
    systems.dedup();
    let has_ratio = systems.iter().any(|s| s == RAPID) && systems.iter().any(|s| s == CHASE);

    let mut cells: BTreeMap<(String, String), BTreeMap<String, f64>> = BTreeMap::new();
    for g in per_group {
        cells
            .entry((g.scenario.clone(), g.query.clone()))
            .or_default()
            .insert(g.system.clone(), g.summary.avg);
    }

    let rows = cells
        .into_iter()
        .map(|((scenario, query), averages)| {
            let speed_ratio = if has_ratio {
                match (averages.get(CHASE), averages.get(RAPID)) {
                    (Some(chase), Some(rapid)) => Some(chase / rapid),
                    _ => None,
                }
            } else {
                None
            };
            ComparisonRow {
                scenario,
                query,
                averages,
                speed_ratio,
                winner: speed_ratio.map(Winner::from_ratio),
            }
        })
        .collect();

    ComparisonTable { systems, has_ratio, rows }
}

pub fn summarize_systems(records: &[BenchmarkRecord]) -> Vec<SystemSummary> {
    group_by(records, |r| r.system.clone())
        .into_iter()
        .filter_map(|(system, samples)| {
            Summary::from_samples(&samples).map(|summary| SystemSummary { system, summary })
        })
        .collect()
}

pub fn summarize_scenarios(records: &[BenchmarkRecord]) -> Vec<ScenarioSummary> {
    group_by(records, |r| (r.scenario.clone(), r.system.clone()))
        .into_iter()
        .filter_map(|((scenario, system), samples)| {
            Summary::from_samples(&samples).map(|s| ScenarioSummary {
                scenario,
                system,
                avg: s.avg,
                std: s.std,
            })
        })
        .collect()
}

/// Mean Time_ms per (row key, column key) for the records of one system.
///
/// Used for chart panels that regroup the raw records.
pub fn mean_by<R, C>(
    records: &[BenchmarkRecord],
    row: R,
    col: C,
) -> BTreeMap<(String, String), f64>
where
    R: Fn(&BenchmarkRecord) -> &str,
    C: Fn(&BenchmarkRecord) -> &str,
{
    group_by(records, |r| (row(r).to_string(), col(r).to_string()))
        .into_iter()
        .map(|(k, samples)| (k, mean(&samples)))
        .collect()
}
