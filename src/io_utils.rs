//! I/O utilities for source selection, fetching, decoding and CSV reader/writer setup.
//!
//! All reads and writes in csv-glance flow through this module:
//!
//! - **Selection**: `Source::select` turns user input into a local `.csv` path
//!   or an `http(s)` URL, rejecting anything else.
//! - **Fetching**: local reads and blocking HTTP downloads, mapped onto
//!   [`GlanceError::Fetch`].
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader/writer construction**: one CSV dialect for parsing and export.
//! - **stdout**: the `-` path convention routes exports to standard output.

use std::{
    fmt, fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use reqwest::{StatusCode, blocking::Client};

use crate::error::{GlanceError, Result};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_EXPORT_FILE: &str = "sustainity-data.csv";
pub const NO_SELECTION_MESSAGE: &str = "Please upload a CSV file first.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Validates a user selection. Only `.csv` files and `http(s)` URLs are accepted.
    pub fn select(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(GlanceError::Selection(NO_SELECTION_MESSAGE.to_string()));
        }
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Ok(Source::Url(trimmed.to_string()));
        }
        let path = PathBuf::from(trimmed);
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Source::File(path)),
            _ => Err(GlanceError::Selection(format!(
                "Please select a .csv file (got '{trimmed}')."
            ))),
        }
    }

    /// Reads the raw text of the source.
    pub fn fetch(&self, encoding: &'static Encoding) -> Result<String> {
        let bytes = match self {
            Source::File(path) => read_file(path)?,
            Source::Url(url) => fetch_url(url)?,
        };
        decode_bytes(&bytes, encoding)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{url}"),
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> anyhow::Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|err| GlanceError::Fetch(format!("{}: {err}", path.display())))
}

fn fetch_url(url: &str) -> Result<Vec<u8>> {
    debug!("Fetching {url}");
    let client = Client::builder()
        .build()
        .map_err(|err| GlanceError::Fetch(format!("Failed to create HTTP client: {err}")))?;
    let response = client
        .get(url)
        .send()
        .map_err(|err| GlanceError::Fetch(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status));
    }
    let body = response
        .bytes()
        .map_err(|err| GlanceError::Fetch(err.to_string()))?;
    Ok(body.to_vec())
}

pub fn status_error(status: StatusCode) -> GlanceError {
    GlanceError::Fetch(format!("HTTP {status}"))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(GlanceError::Fetch(format!(
            "Failed to decode text with encoding {}",
            encoding.name()
        )))
    } else {
        Ok(text.into_owned())
    }
}

pub fn open_csv_reader<R>(reader: R) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(DEFAULT_CSV_DELIMITER)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_writer<W>(writer: W) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

/// Writes a finished buffer to `path`, or to stdout for `-`.
pub fn write_output(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    if is_dash(path) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(contents).context("Writing export to stdout")?;
        stdout.flush().context("Flushing stdout")?;
    } else {
        fs::write(path, contents).with_context(|| format!("Creating output file {path:?}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use encoding_rs::WINDOWS_1252;

    use super::*;

    #[test]
    fn select_accepts_csv_paths_and_urls() {
        assert_eq!(
            Source::select("data/Report.CSV").unwrap(),
            Source::File(PathBuf::from("data/Report.CSV"))
        );
        assert_eq!(
            Source::select(" https://example.org/data.csv ").unwrap(),
            Source::Url("https://example.org/data.csv".into())
        );
    }

    #[test]
    fn select_rejects_missing_or_non_csv_input() {
        assert_eq!(
            Source::select("  ").unwrap_err(),
            GlanceError::Selection(NO_SELECTION_MESSAGE.into())
        );
        assert!(matches!(
            Source::select("notes.txt").unwrap_err(),
            GlanceError::Selection(_)
        ));
    }

    #[test]
    fn status_error_carries_code() {
        let err = status_error(StatusCode::NOT_FOUND);
        assert!(matches!(err, GlanceError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn fetch_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::File(dir.path().join("absent.csv"));
        assert!(matches!(
            source.fetch(UTF_8).unwrap_err(),
            GlanceError::Fetch(_)
        ));
    }

    #[test]
    fn decode_bytes_strips_bom_and_honours_encoding() {
        let text = decode_bytes(b"\xEF\xBB\xBFname\n", UTF_8).unwrap();
        assert_eq!(text, "name\n");
        let latin = decode_bytes(b"caf\xE9", WINDOWS_1252).unwrap();
        assert_eq!(latin, "café");
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some("latin1")).unwrap(), WINDOWS_1252);
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
