use log::debug;

use crate::{
    data::{CellValue, Record},
    error::{GlanceError, Result},
    io_utils,
};

/// Serializes `records` to CSV text. Columns are the keys of the first record,
/// or `fallback_columns` when there are no records.
///
/// The whole document is built in memory, so a failure never leaves a partial file behind.
pub fn export_csv<'a, I>(records: I, fallback_columns: &[String]) -> Result<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut records = records.into_iter().peekable();
    let columns = match records.peek() {
        Some(first) => first.keys().cloned().collect::<Vec<_>>(),
        None => fallback_columns.to_vec(),
    };

    let mut writer = io_utils::open_csv_writer(Vec::new());
    if !columns.is_empty() {
        writer.write_record(&columns).map_err(export_error)?;
    }
    let mut written = 0usize;
    for record in records {
        let row = columns
            .iter()
            .map(|column| record.get(column).map(CellValue::as_display).unwrap_or_default());
        writer.write_record(row).map_err(export_error)?;
        written += 1;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| GlanceError::Export(err.error().to_string()))?;
    let text = String::from_utf8(bytes).map_err(|err| GlanceError::Export(err.to_string()))?;
    debug!("Serialized {written} row(s) across {} column(s)", columns.len());
    Ok(text)
}

fn export_error(err: csv::Error) -> GlanceError {
    GlanceError::Export(err.to_string())
}
