use csv::ErrorKind;
use itertools::Itertools;
use serde_json::Value as JsonValue;

use crate::{
    data::RawRecord,
    error::{GlanceError, Result},
    io_utils,
};

const MAX_REPORTED_ERRORS: usize = 5;

/// Header names plus one raw record per non-empty data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// Parses CSV text using the first row as header.
///
/// Every data row is read even after a failure so the report covers more than
/// the first bad line; any row error fails the whole parse.
pub fn parse_csv(text: &str) -> Result<ParsedCsv> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes());
    let headers = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect::<Vec<_>>(),
        Err(err) => return Err(GlanceError::Parse(describe_error(&err))),
    };

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                let mut raw = RawRecord::with_capacity(headers.len());
                for (name, field) in headers.iter().zip(record.iter()) {
                    raw.insert(name.clone(), JsonValue::String(field.to_string()));
                }
                records.push(raw);
            }
            Err(err) => errors.push(describe_error(&err)),
        }
    }

    if !errors.is_empty() {
        let total = errors.len();
        let mut message = errors.iter().take(MAX_REPORTED_ERRORS).join("; ");
        if total > MAX_REPORTED_ERRORS {
            message.push_str(&format!(" (and {} more)", total - MAX_REPORTED_ERRORS));
        }
        return Err(GlanceError::Parse(message));
    }

    let headers = headers.into_iter().unique().collect();
    Ok(ParsedCsv { headers, records })
}

fn describe_error(err: &csv::Error) -> String {
    let row = err.position().map(|pos| pos.line());
    let detail = match err.kind() {
        ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("found {len} field(s), expected {expected_len}"),
        ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 ({err})"),
        _ => err.to_string(),
    };
    match row {
        Some(line) => format!("Row {line}: {detail}"),
        None => detail,
    }
}
