/// Six-panel SVG chart sheet.
///
/// Layout is a fixed 2x3 grid:
///
/// | by query (bars) | by scenario (bars) | ratio histogram |
/// | Rapid heatmap   | ChaseGQR heatmap   | stability boxes |
///
/// The SVG is assembled by hand; every panel degrades to an empty frame when
/// it has nothing to draw.

use std::collections::BTreeMap;
use std::path::Path;

use crate::dataset::BenchmarkRecord;
use crate::errors::AnalysisError;
use crate::stats::{self, Analysis, CHASE, RAPID};

pub const CHART_FILE: &str = "FINAL_ANALYSIS_CHARTS.svg";

const WIDTH: f64 = 1800.0;
const HEIGHT: f64 = 1080.0;
const PANEL_W: f64 = 560.0;
const PANEL_H: f64 = 470.0;
const HIST_BINS: usize = 15;

const SERIES_COLORS: [&str; 6] = ["#3498db", "#e74c3c", "#2ecc71", "#9b59b6", "#f39c12", "#1abc9c"];
const YL_GN_BU: [(u8, u8, u8); 3] = [(0xff, 0xff, 0xd9), (0x41, 0xb6, 0xc4), (0x08, 0x1d, 0x58)];
const YL_OR_RD: [(u8, u8, u8); 3] = [(0xff, 0xff, 0xcc), (0xfd, 0x8d, 0x3c), (0x80, 0x00, 0x26)];

// ---------------------------------------------------------------------------
// Drawing primitives
// ---------------------------------------------------------------------------

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

struct Canvas {
    svg: String,
}

impl Canvas {
    fn new(width: f64, height: f64) -> Self {
        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">\n"
        ));
        svg.push_str("  <style>\n");
        svg.push_str("    text { font-family: 'DejaVu Sans', sans-serif; font-size: 12px; }\n");
        svg.push_str("    .title { font-size: 16px; font-weight: bold; }\n");
        svg.push_str("    .suptitle { font-size: 20px; font-weight: bold; }\n");
        svg.push_str("    .grid { stroke: #000; stroke-opacity: 0.15; }\n");
        svg.push_str("  </style>\n");
        svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
        Canvas { svg }
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: &str) {
        self.svg.push_str(&format!(
            "  <rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{fill}\" stroke=\"{stroke}\"/>\n",
            w.max(0.0),
            h.max(0.0)
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, extra: &str) {
        self.svg.push_str(&format!(
            "  <line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{stroke}\" {extra}/>\n"
        ));
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, stroke: &str) {
        self.svg.push_str(&format!(
            "  <circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"none\" stroke=\"{stroke}\"/>\n"
        ));
    }

    fn text(&mut self, x: f64, y: f64, anchor: &str, attrs: &str, content: &str) {
        self.svg.push_str(&format!(
            "  <text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"{anchor}\" {attrs}>{}</text>\n",
            escape(content)
        ));
    }

    /// Label rotated about its anchor point, for long category names.
    fn rotated_text(&mut self, x: f64, y: f64, degrees: f64, content: &str) {
        self.text(
            x,
            y,
            "end",
            &format!("transform=\"rotate({degrees:.0} {x:.1} {y:.1})\""),
            content,
        );
    }

    fn finish(mut self) -> String {
        self.svg.push_str("</svg>\n");
        self.svg
    }
}

/// Linear map from a data range onto a pixel range.
#[derive(Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn new(lo: f64, hi: f64, from: f64, to: f64) -> Self {
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, lo + 0.5) };
        Scale { lo, hi, from, to }
    }

    fn map(&self, v: f64) -> f64 {
        self.from + (v - self.lo) / (self.hi - self.lo) * (self.to - self.from)
    }

    fn ticks(&self, n: usize) -> Vec<f64> {
        (0..=n)
            .map(|i| self.lo + (self.hi - self.lo) * i as f64 / n as f64)
            .collect()
    }
}

/// One cell of the grid plus its inner plotting area.
#[derive(Clone, Copy)]
struct Panel {
    x: f64,
    y: f64,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Panel {
    fn at(col: usize, row: usize) -> Self {
        let x = 30.0 + col as f64 * (PANEL_W + 30.0);
        let y = 80.0 + row as f64 * (PANEL_H + 30.0);
        Panel {
            x,
            y,
            left: x + 75.0,
            right: x + PANEL_W - 20.0,
            top: y + 45.0,
            bottom: y + PANEL_H - 85.0,
        }
    }

    fn frame(&self, canvas: &mut Canvas, title: &str) {
        canvas.rect(self.x, self.y, PANEL_W, PANEL_H, "#ffffff", "#dddddd");
        canvas.text(self.x + PANEL_W / 2.0, self.y + 25.0, "middle", "class=\"title\"", title);
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }

    fn axis_labels(&self, canvas: &mut Canvas, x_label: &str, y_label: &str) {
        canvas.text((self.left + self.right) / 2.0, self.y + PANEL_H - 12.0, "middle", "", x_label);
        let cx = self.x + 18.0;
        let cy = (self.top + self.bottom) / 2.0;
        canvas.text(
            cx,
            cy,
            "middle",
            &format!("transform=\"rotate(-90 {cx:.1} {cy:.1})\""),
            y_label,
        );
    }

    /// Horizontal grid lines with tick labels on the left.
    fn y_grid(&self, canvas: &mut Canvas, scale: &Scale) {
        for tick in scale.ticks(5) {
            let y = scale.map(tick);
            canvas.line(self.left, y, self.right, y, "#000", "class=\"grid\"");
            canvas.text(self.left - 6.0, y + 4.0, "end", "", &format!("{tick:.0}"));
        }
        canvas.line(self.left, self.bottom, self.right, self.bottom, "#333", "");
        canvas.line(self.left, self.top, self.left, self.bottom, "#333", "");
    }

    fn empty_note(&self, canvas: &mut Canvas, note: &str) {
        canvas.text(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
            "middle",
            "fill=\"#888\"",
            note,
        );
    }
}

fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

fn color_scale(stops: &[(u8, u8, u8); 3], t: f64) -> String {
    let t = t.clamp(0.0, 1.0) * 2.0;
    let (a, b, local) = if t <= 1.0 {
        (stops[0], stops[1], t)
    } else {
        (stops[1], stops[2], t - 1.0)
    };
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * local).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

fn grouped_bars(
    canvas: &mut Canvas,
    panel: Panel,
    title: &str,
    x_label: &str,
    means: &BTreeMap<(String, String), f64>,
    rotate_labels: bool,
) {
    panel.frame(canvas, title);
    let mut categories: Vec<&str> = means.keys().map(|(c, _)| c.as_str()).collect();
    categories.dedup();
    let mut systems: Vec<&str> = means.keys().map(|(_, s)| s.as_str()).collect();
    systems.sort();
    systems.dedup();
    if categories.is_empty() {
        panel.empty_note(canvas, "no data");
        return;
    }

    let peak = means.values().copied().fold(0.0_f64, f64::max);
    let scale = Scale::new(0.0, if peak > 0.0 { peak * 1.1 } else { 1.0 }, panel.bottom, panel.top);
    panel.y_grid(canvas, &scale);
    panel.axis_labels(canvas, x_label, "Average Time (ms)");

    let group_w = panel.width() / categories.len() as f64;
    let bar_w = group_w * 0.7 / systems.len() as f64;
    for (ci, category) in categories.iter().enumerate() {
        let group_x = panel.left + ci as f64 * group_w + group_w * 0.15;
        for (si, system) in systems.iter().enumerate() {
            let key = (category.to_string(), system.to_string());
            if let Some(&v) = means.get(&key) {
                let y = scale.map(v);
                canvas.rect(
                    group_x + si as f64 * bar_w,
                    y,
                    bar_w,
                    panel.bottom - y,
                    series_color(si),
                    "none",
                );
            }
        }
        let label_x = panel.left + (ci as f64 + 0.5) * group_w;
        if rotate_labels {
            canvas.rotated_text(label_x, panel.bottom + 14.0, -45.0, category);
        } else {
            canvas.text(label_x, panel.bottom + 16.0, "middle", "", category);
        }
    }

    for (si, system) in systems.iter().enumerate() {
        let y = panel.top + 4.0 + si as f64 * 18.0;
        canvas.rect(panel.right - 110.0, y, 12.0, 12.0, series_color(si), "none");
        canvas.text(panel.right - 92.0, y + 11.0, "start", "", system);
    }
}

fn ratio_histogram(canvas: &mut Canvas, panel: Panel, analysis: &Analysis) {
    panel.frame(canvas, "Speed Ratio Distribution (Chase/Rapid)");
    let finite: Vec<f64> = analysis
        .comparison
        .ratios()
        .into_iter()
        .filter(|r| r.is_finite())
        .collect();
    if !analysis.comparison.has_ratio || finite.is_empty() {
        panel.empty_note(canvas, "no ratio data");
        return;
    }
    // A zero Rapid average makes the mean infinite; the bins are still drawn
    let mean_ratio = analysis.comparison.mean_ratio().filter(|m| m.is_finite());

    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, lo + 0.5) };
    let bin_w = (hi - lo) / HIST_BINS as f64;
    let mut counts = [0usize; HIST_BINS];
    for r in &finite {
        let idx = (((r - lo) / bin_w) as usize).min(HIST_BINS - 1);
        counts[idx] += 1;
    }

    let pad = (hi - lo) * 0.05;
    let x_scale = Scale::new(lo.min(1.0) - pad, hi.max(1.0) + pad, panel.left, panel.right);
    let peak = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
    let y_scale = Scale::new(0.0, peak * 1.1, panel.bottom, panel.top);
    panel.y_grid(canvas, &y_scale);
    panel.axis_labels(canvas, "Speed Ratio (>1 = Chase faster)", "Frequency");

    for (i, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let x0 = x_scale.map(lo + i as f64 * bin_w);
        let x1 = x_scale.map(lo + (i + 1) as f64 * bin_w);
        let y = y_scale.map(count as f64);
        canvas.rect(x0, y, x1 - x0, panel.bottom - y, "#4682b4", "#000000");
    }
    for tick in x_scale.ticks(4) {
        canvas.text(x_scale.map(tick), panel.bottom + 16.0, "middle", "", &format!("{tick:.2}"));
    }

    let dashed = "stroke-width=\"2\" stroke-dasharray=\"6 4\"";
    let base_x = x_scale.map(1.0);
    canvas.line(base_x, panel.top, base_x, panel.bottom, "#ff0000", dashed);
    canvas.line(panel.right - 130.0, panel.top + 10.0, panel.right - 110.0, panel.top + 10.0, "#ff0000", dashed);
    canvas.text(panel.right - 104.0, panel.top + 14.0, "start", "", "Baseline (1.0)");

    if let Some(mean_ratio) = mean_ratio {
        let mean_x = x_scale.map(mean_ratio);
        canvas.line(mean_x, panel.top, mean_x, panel.bottom, "#008000", dashed);
        canvas.line(panel.right - 130.0, panel.top + 28.0, panel.right - 110.0, panel.top + 28.0, "#008000", dashed);
        canvas.text(panel.right - 104.0, panel.top + 32.0, "start", "", &format!("Mean: {mean_ratio:.2}"));
    }
}

fn heatmap(
    canvas: &mut Canvas,
    panel: Panel,
    system: &str,
    records: &[BenchmarkRecord],
    stops: &[(u8, u8, u8); 3],
) {
    panel.frame(canvas, &format!("{system} Performance Heatmap (ms)"));
    let subset: Vec<BenchmarkRecord> = records
        .iter()
        .filter(|r| r.system == system)
        .cloned()
        .collect();
    let cells = stats::mean_by(&subset, |r| r.scenario.as_str(), |r| r.query.as_str());
    if cells.is_empty() {
        panel.empty_note(canvas, "no data");
        return;
    }
    panel.axis_labels(canvas, "Query", "Scenario");

    let mut scenarios: Vec<&str> = cells.keys().map(|(s, _)| s.as_str()).collect();
    scenarios.dedup();
    let mut queries: Vec<&str> = cells.keys().map(|(_, q)| q.as_str()).collect();
    queries.sort();
    queries.dedup();

    let vmin = cells.values().copied().fold(f64::INFINITY, f64::min);
    let vmax = cells.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let cell_w = panel.width() / queries.len() as f64;
    let cell_h = panel.height() / scenarios.len() as f64;

    for (ri, scenario) in scenarios.iter().enumerate() {
        let y = panel.top + ri as f64 * cell_h;
        canvas.text(panel.left - 6.0, y + cell_h / 2.0 + 4.0, "end", "", scenario);
        for (qi, query) in queries.iter().enumerate() {
            let key = (scenario.to_string(), query.to_string());
            let Some(&v) = cells.get(&key) else {
                continue;
            };
            let t = if vmax > vmin { (v - vmin) / (vmax - vmin) } else { 0.5 };
            let x = panel.left + qi as f64 * cell_w;
            canvas.rect(x, y, cell_w, cell_h, &color_scale(stops, t), "#ffffff");
            let ink = if t > 0.6 { "fill=\"#ffffff\"" } else { "fill=\"#000000\"" };
            canvas.text(x + cell_w / 2.0, y + cell_h / 2.0 + 4.0, "middle", ink, &format!("{v:.0}"));
        }
    }
    for (qi, query) in queries.iter().enumerate() {
        canvas.text(panel.left + (qi as f64 + 0.5) * cell_w, panel.bottom + 16.0, "middle", "", query);
    }
    canvas.text(
        panel.right,
        panel.bottom + 34.0,
        "end",
        "fill=\"#555\"",
        &format!("{vmin:.0} - {vmax:.0} ms"),
    );
}

fn stability_boxes(canvas: &mut Canvas, panel: Panel, records: &[BenchmarkRecord]) {
    panel.frame(canvas, "Performance Stability Comparison");
    let mut samples: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        samples.entry(r.system.as_str()).or_default().push(r.time_ms);
    }
    if samples.is_empty() {
        panel.empty_note(canvas, "no data");
        return;
    }

    let lo = records.iter().map(|r| r.time_ms).fold(f64::INFINITY, f64::min);
    let hi = records.iter().map(|r| r.time_ms).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.05).max(1.0);
    let scale = Scale::new(lo - pad, hi + pad, panel.bottom, panel.top);
    panel.y_grid(canvas, &scale);
    panel.axis_labels(canvas, "System", "Time (ms)");

    let slot_w = panel.width() / samples.len() as f64;
    for (i, (system, values)) in samples.iter().enumerate() {
        let Some((q1, median, q3)) = stats::quartiles(values) else {
            continue;
        };
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;
        let whisker_lo = values.iter().copied().filter(|v| *v >= low_fence).fold(q1, f64::min);
        let whisker_hi = values.iter().copied().filter(|v| *v <= high_fence).fold(q3, f64::max);

        let cx = panel.left + (i as f64 + 0.5) * slot_w;
        let half = slot_w * 0.25;
        canvas.line(cx, scale.map(whisker_hi), cx, scale.map(q3), "#000000", "");
        canvas.line(cx, scale.map(q1), cx, scale.map(whisker_lo), "#000000", "");
        canvas.line(cx - half / 2.0, scale.map(whisker_hi), cx + half / 2.0, scale.map(whisker_hi), "#000000", "");
        canvas.line(cx - half / 2.0, scale.map(whisker_lo), cx + half / 2.0, scale.map(whisker_lo), "#000000", "");
        canvas.rect(cx - half, scale.map(q3), half * 2.0, scale.map(q1) - scale.map(q3), "#add8e6", "#000000");
        canvas.line(cx - half, scale.map(median), cx + half, scale.map(median), "#ff0000", "stroke-width=\"2\"");
        for v in values.iter().filter(|v| **v < low_fence || **v > high_fence) {
            canvas.circle(cx, scale.map(*v), 3.0, "#000000");
        }
        canvas.text(cx, panel.bottom + 16.0, "middle", "", system);
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// Render the full chart sheet for the successful records.
pub fn render_chart_sheet(records: &[BenchmarkRecord], analysis: &Analysis) -> String {
    let mut canvas = Canvas::new(WIDTH, HEIGHT);
    canvas.text(
        WIDTH / 2.0,
        45.0,
        "middle",
        "class=\"suptitle\"",
        "Rapid vs ChaseGQR Performance Analysis",
    );

    let by_query = stats::mean_by(records, |r| r.query.as_str(), |r| r.system.as_str());
    grouped_bars(&mut canvas, Panel::at(0, 0), "Average Performance by Query", "Query", &by_query, false);

    let by_scenario = stats::mean_by(records, |r| r.scenario.as_str(), |r| r.system.as_str());
    grouped_bars(&mut canvas, Panel::at(1, 0), "Average Performance by Scenario", "Scenario", &by_scenario, true);

    ratio_histogram(&mut canvas, Panel::at(2, 0), analysis);
    heatmap(&mut canvas, Panel::at(0, 1), RAPID, records, &YL_GN_BU);
    heatmap(&mut canvas, Panel::at(1, 1), CHASE, records, &YL_OR_RD);
    stability_boxes(&mut canvas, Panel::at(2, 1), records);

    canvas.finish()
}

pub fn write_chart_sheet(
    records: &[BenchmarkRecord],
    analysis: &Analysis,
    path: &Path,
) -> Result<(), AnalysisError> {
    let svg = render_chart_sheet(records, analysis);
    std::fs::write(path, svg).map_err(|e| AnalysisError::io(path, e))
}
