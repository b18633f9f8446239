use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{data::Record, view::SortState};

/// Renders records as an aligned text table. The active sort column is marked in the header.
pub fn render_records(columns: &[String], rows: &[&Record], sort: &SortState) -> String {
    let headers = columns
        .iter()
        .map(|name| match sort.column.as_deref() {
            Some(active) if active == name => {
                format!("{name} {}", if sort.ascending { '▲' } else { '▼' })
            }
            _ => name.clone(),
        })
        .collect::<Vec<_>>();
    let cells = rows
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|name| {
                    record
                        .get(name)
                        .map(|value| flatten_whitespace(&value.as_display()).into_owned())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", join_padded(&headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", rule.join("  "));
    for row in &cells {
        let _ = writeln!(output, "{}", join_padded(row, &widths));
    }
    output
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn flatten_whitespace(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
