use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

/// One parsed row before sanitizing. Keys keep header order.
pub type RawRecord = IndexMap<String, serde_json::Value>;

/// One sanitized row. Every value is a scalar.
pub type Record = IndexMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Numeric reading of the cell: numbers as-is, text only when it parses fully.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number(s),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Parses `value` as a number only when the whole trimmed text is a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Rust accepts "inf" and "NaN"; spreadsheets do not treat them as numbers.
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Timestamp in milliseconds for text that reads as a date or a date-time.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(dt) = parse_naive_datetime(trimmed) {
        return Some(dt.and_utc().timestamp_millis());
    }
    parse_naive_date(trimmed)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// An immutable, ordered set of sanitized records sharing one column set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
    revision: u64,
}

impl Dataset {
    /// Columns come from the first record; `fallback` is used only when there are no records.
    pub fn new(fallback: Vec<String>, records: Vec<Record>, revision: u64) -> Self {
        let columns = match records.first() {
            Some(first) => first.keys().cloned().collect(),
            None => fallback,
        };
        Self {
            columns,
            records,
            revision,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Generation of the ingestion that produced this dataset.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}
