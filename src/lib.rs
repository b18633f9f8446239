pub mod chart;
pub mod cli;
pub mod data;
pub mod error;
pub mod explore;
pub mod export;
pub mod ingest;
pub mod io_utils;
pub mod parse;
pub mod sanitize;
pub mod session;
pub mod table;
pub mod view;

use std::{env, io, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SourceArgs, ViewOptions},
    session::Session,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_glance", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::View(args) => handle_view(&args),
        Commands::Chart(args) => handle_chart(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Explore(args) => handle_explore(&args),
    }
}

fn open_session(source: &SourceArgs) -> Result<Session> {
    let encoding = io_utils::resolve_encoding(source.input_encoding.as_deref())?;
    let mut session = Session::new(encoding);
    let input = source.input.as_deref().unwrap_or_default();
    session
        .select(input)
        .with_context(|| format!("Loading '{input}'"))?;
    Ok(session)
}

fn apply_view_options(session: &mut Session, options: &ViewOptions) -> Result<()> {
    for column in options
        .sort
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
    {
        let known = session.dataset().is_some_and(|d| d.has_column(column));
        if !known {
            bail!("Column '{column}' not found for sort");
        }
        session.toggle_sort(column);
    }
    if options.desc {
        let mut sort = session.sort().clone();
        if sort.column.is_none() {
            bail!("--desc requires a --sort column");
        }
        sort.ascending = false;
        session.set_sort(sort);
    }
    session.set_filter(options.filter.clone());
    debug!(
        "View options: filter {:?}, sort {:?}",
        session.filter(),
        session.sort()
    );
    Ok(())
}

fn handle_view(args: &cli::ViewArgs) -> Result<()> {
    let mut session = open_session(&args.source)?;
    apply_view_options(&mut session, &args.view)?;
    let columns = session
        .dataset()
        .map(|d| d.columns().to_vec())
        .unwrap_or_default();
    let total = session.dataset().map_or(0, |d| d.len());
    let sort = session.sort().clone();
    let mut rows = session.visible_rows();
    let visible = rows.len();
    if let Some(limit) = args.rows {
        rows.truncate(limit);
    }
    print!("{}", table::render_records(&columns, &rows, &sort));
    info!(
        "Displayed {} of {visible} matching row(s) ({total} loaded)",
        rows.len()
    );
    Ok(())
}

fn handle_chart(args: &cli::ChartArgs) -> Result<()> {
    let mut session = open_session(&args.source)?;
    match session.chart() {
        Some(data) if args.json => {
            let json = serde_json::to_string_pretty(data).context("Serializing chart data")?;
            println!("{json}");
            info!("Emitted {} chart series", data.series.len());
        }
        Some(data) => {
            print!("{}", chart::render_chart(data));
            info!("Rendered {} chart series", data.series.len());
        }
        None => println!("No chart data"),
    }
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let mut session = open_session(&args.source)?;
    apply_view_options(&mut session, &args.view)?;
    session
        .export_to(&args.output)
        .with_context(|| format!("Exporting to {:?}", args.output))?;
    Ok(())
}

fn handle_explore(args: &cli::ExploreArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.source.input_encoding.as_deref())?;
    let mut session = Session::new(encoding);
    let stdin = io::stdin();
    let stdout = io::stdout();
    explore::run(
        &mut session,
        args.source.input.as_deref(),
        stdin.lock(),
        stdout.lock(),
    )
}
