//! Numeric column summary for bar charts.
//!
//! Eligibility is decided from the first record alone: a column whose first
//! value is a number (or fully numeric text) is charted for every row, with
//! non-numeric cells in later rows becoming gaps.

use std::fmt::Write as _;

use log::debug;
use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;

use crate::data::{CellValue, Dataset};

const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Columns whose first-row value reads as a number, in column order.
pub fn numeric_columns(dataset: &Dataset) -> Vec<String> {
    let Some(first) = dataset.records().first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter(|(_, value)| value.as_number().is_some())
        .map(|(name, _)| name.clone())
        .collect()
}

/// Builds chart series for numeric columns, or `None` when nothing qualifies.
pub fn summarize(dataset: &Dataset) -> Option<ChartData> {
    let columns = numeric_columns(dataset);
    if columns.is_empty() {
        debug!("No numeric columns in first row; no chart data");
        return None;
    }
    let colors = series_colors(columns.len());
    let series = columns
        .into_iter()
        .zip(colors)
        .map(|(label, color)| {
            let values = dataset
                .records()
                .iter()
                .map(|record| record.get(&label).and_then(CellValue::as_number))
                .collect();
            ChartSeries {
                label,
                values,
                color,
            }
        })
        .collect::<Vec<_>>();
    let labels = (1..=dataset.len()).map(|n| format!("Row {n}")).collect();
    debug!(
        "Summarized {} numeric column(s) over {} row(s)",
        series.len(),
        dataset.len()
    );
    Some(ChartData { labels, series })
}

/// Evenly spaced hues so each series keeps its color across renders.
pub fn series_colors(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Text bar chart, one block per series, bars scaled to the series' largest magnitude.
pub fn render_chart(chart: &ChartData) -> String {
    let label_width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut output = String::new();
    for series in &chart.series {
        let _ = writeln!(output, "{} ({})", series.label, series.color);
        let peak = series
            .values
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        for (label, value) in chart.labels.iter().zip(&series.values) {
            let line = match value {
                Some(v) => {
                    let length = if peak > 0.0 {
                        ((v.abs() / peak) * BAR_WIDTH as f64).round() as usize
                    } else {
                        0
                    };
                    let bar = (if *v < 0.0 { "-" } else { "#" }).repeat(length);
                    format!("{label:<label_width$}  {bar} {}", CellValue::Number(*v))
                }
                None => format!("{label:<label_width$}  (no value)"),
            };
            let _ = writeln!(output, "{}", line.trim_end());
        }
        output.push('\n');
    }
    output
}
