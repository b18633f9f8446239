//! Line-oriented interactive session.
//!
//! Each input line is one command. Failures are shown as error banners and
//! never end the session; only `quit` or end of input does.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use log::debug;

use crate::{
    chart,
    ingest::IngestState,
    io_utils::DEFAULT_EXPORT_FILE,
    session::Session,
    table,
};

const DEFAULT_SHOW_ROWS: usize = 20;

const HELP: &str = "\
Commands:
  load <path-or-url>   select a CSV source
  filter [text]        show rows containing text (empty clears)
  sort <column>        sort by column; repeat to flip direction
  show [rows]          print the table (default 20 rows)
  chart                print the numeric column summary
  export [path]        write visible rows as CSV (default sustainity-data.csv)
  status               show load state and errors
  help                 show this message
  quit                 leave the session";

enum Flow {
    Continue,
    Quit,
}

pub fn run<R, W>(session: &mut Session, initial: Option<&str>, input: R, mut out: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(out, "csv-glance explore; type 'help' for commands")?;
    if let Some(source) = initial.filter(|s| !s.trim().is_empty()) {
        load(session, source, &mut out)?;
    }
    for line in input.lines() {
        let line = line.context("Reading command from stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("explore command: {line}");
        if let Flow::Quit = dispatch(session, line, &mut out)? {
            break;
        }
    }
    session.detach();
    out.flush()?;
    Ok(())
}

fn dispatch<W: Write>(session: &mut Session, line: &str, out: &mut W) -> Result<Flow> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match command.to_ascii_lowercase().as_str() {
        "load" => load(session, rest, out)?,
        "filter" => {
            session.set_filter(rest);
            let visible = session.visible_rows().len();
            let total = session.dataset().map_or(0, |d| d.len());
            writeln!(out, "Filter '{rest}': {visible} of {total} row(s)")?;
        }
        "sort" => sort(session, rest, out)?,
        "show" => {
            let limit = match rest {
                "" => DEFAULT_SHOW_ROWS,
                n => match n.parse::<usize>() {
                    Ok(n) => n,
                    Err(_) => {
                        writeln!(out, "show expects a row count, got '{n}'")?;
                        return Ok(Flow::Continue);
                    }
                },
            };
            show(session, limit, out)?;
        }
        "chart" => match session.chart() {
            Some(data) => write!(out, "{}", chart::render_chart(data))?,
            None => writeln!(out, "No chart data")?,
        },
        "export" => {
            let path = if rest.is_empty() {
                PathBuf::from(DEFAULT_EXPORT_FILE)
            } else {
                PathBuf::from(rest)
            };
            match session.export_to(&path) {
                Ok(rows) => writeln!(out, "Exported {rows} row(s) to {}", path.display())?,
                Err(_) => write_banners(session, out)?,
            }
        }
        "status" => status(session, out)?,
        "help" => writeln!(out, "{HELP}")?,
        "quit" | "exit" => return Ok(Flow::Quit),
        other => writeln!(out, "Unknown command '{other}'. Type 'help' for commands.")?,
    }
    Ok(Flow::Continue)
}

fn load<W: Write>(session: &mut Session, source: &str, out: &mut W) -> Result<()> {
    match session.select(source) {
        Ok(()) => {
            if let Some(dataset) = session.dataset() {
                writeln!(
                    out,
                    "Loaded {} row(s) across {} column(s)",
                    dataset.len(),
                    dataset.columns().len()
                )?;
            }
        }
        Err(_) => write_banners(session, out)?,
    }
    Ok(())
}

fn sort<W: Write>(session: &mut Session, column: &str, out: &mut W) -> Result<()> {
    let known = session.dataset().is_some_and(|d| d.has_column(column));
    if !known {
        writeln!(out, "Unknown column '{column}'")?;
        return Ok(());
    }
    session.toggle_sort(column);
    let direction = if session.sort().ascending {
        "ascending"
    } else {
        "descending"
    };
    writeln!(out, "Sorted by {column} {direction}")?;
    Ok(())
}

fn show<W: Write>(session: &mut Session, limit: usize, out: &mut W) -> Result<()> {
    let Some(columns) = session.dataset().map(|d| d.columns().to_vec()) else {
        writeln!(out, "No data loaded")?;
        return Ok(());
    };
    let sort = session.sort().clone();
    let rows = session.visible_rows();
    let shown = rows.len().min(limit);
    write!(out, "{}", table::render_records(&columns, &rows[..shown], &sort))?;
    if rows.len() > shown {
        writeln!(out, "... {} more row(s)", rows.len() - shown)?;
    }
    Ok(())
}

fn status<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let state = match session.table_state() {
        IngestState::Idle => "idle".to_string(),
        IngestState::Loading => "loading".to_string(),
        IngestState::Ready(dataset) => format!("ready ({} row(s))", dataset.len()),
        IngestState::FetchFailed(_) => "fetch failed".to_string(),
        IngestState::ParseFailed(_) => "parse failed".to_string(),
    };
    match session.source() {
        Some(source) => writeln!(out, "Source: {source} [{state}]")?,
        None => writeln!(out, "Source: none [{state}]")?,
    }
    writeln!(out, "Filter: '{}'", session.filter())?;
    match session.sort().column.as_deref() {
        Some(column) => writeln!(
            out,
            "Sort: {column} {}",
            if session.sort().ascending { "ascending" } else { "descending" }
        )?,
        None => writeln!(out, "Sort: none")?,
    }
    write_banners(session, out)
}

fn write_banners<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    for message in session.banners().messages() {
        writeln!(out, "[error] {message}")?;
    }
    Ok(())
}
