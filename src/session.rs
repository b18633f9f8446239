//! Top-level session: owns the datasets, view settings and error banners.
//!
//! The table and the chart are independent consumers. Each runs its own
//! ingestion and keeps its own dataset, so a chart-side sanitization choice
//! never leaks into the table or the export.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    chart::{self, ChartData},
    data::{Dataset, Record},
    error::{ErrorBanners, GlanceError, Result},
    export,
    ingest::{IngestState, Ingestion},
    io_utils::{self, NO_SELECTION_MESSAGE, Source},
    sanitize::SanitizeTarget,
    view::{SortState, TableView},
};

pub struct Session {
    encoding: &'static Encoding,
    source: Option<Source>,
    table: Ingestion,
    chart: Ingestion,
    filter: String,
    sort: SortState,
    view: TableView,
    chart_cache: Option<(u64, Option<ChartData>)>,
    banners: ErrorBanners,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(UTF_8)
    }
}

impl Session {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            source: None,
            table: Ingestion::new(SanitizeTarget::Display),
            chart: Ingestion::new(SanitizeTarget::Chart),
            filter: String::new(),
            sort: SortState::default(),
            view: TableView::default(),
            chart_cache: None,
            banners: ErrorBanners::default(),
        }
    }

    pub fn banners(&self) -> &ErrorBanners {
        &self.banners
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub fn table_state(&self) -> &IngestState {
        self.table.state()
    }

    pub fn chart_state(&self) -> &IngestState {
        self.chart.state()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.table.dataset()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    /// Selects a new source and loads it into both consumers.
    pub fn select(&mut self, input: &str) -> Result<()> {
        self.banners.clear();
        let source = match Source::select(input) {
            Ok(source) => source,
            Err(err) => {
                self.banners.record(&err);
                return Err(err);
            }
        };
        info!("Selected source {source}");
        self.source = Some(source.clone());

        let table_result = self.table.load(&source, self.encoding).map(|_| ());
        let chart_result = self.chart.load(&source, self.encoding).map(|_| ());
        for result in [&table_result, &chart_result] {
            if let Err(err) = result {
                self.banners.record(err);
            }
        }
        if table_result.is_ok()
            && let Some(dataset) = self.table.dataset()
        {
            info!(
                "Loaded {} row(s) across {} column(s) from {source}",
                dataset.len(),
                dataset.columns().len()
            );
        }
        table_result.and(chart_result)
    }

    /// Stops tracking the current source; late results are ignored.
    pub fn detach(&mut self) {
        self.table.detach();
        self.chart.detach();
        self.view.invalidate();
        self.chart_cache = None;
        self.source = None;
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        debug!("Filter set to {:?}", self.filter);
    }

    /// Header click: same column flips direction, a new column sorts ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort.toggle(column);
        debug!("Sort set to {:?}", self.sort);
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    /// Records currently visible after filtering and sorting.
    pub fn visible_rows(&mut self) -> Vec<&Record> {
        let Some(dataset) = self.table.dataset() else {
            return Vec::new();
        };
        self.view
            .refresh(dataset, &self.filter, &self.sort)
            .iter()
            .map(|&idx| &dataset.records()[idx])
            .collect()
    }

    pub fn view_recomputations(&self) -> usize {
        self.view.recomputations()
    }

    /// Numeric summary of the chart-side dataset, cached per dataset revision.
    pub fn chart(&mut self) -> Option<&ChartData> {
        let dataset = self.chart.dataset()?;
        let revision = dataset.revision();
        let stale = !matches!(&self.chart_cache, Some((cached, _)) if *cached == revision);
        if stale {
            self.chart_cache = Some((revision, chart::summarize(dataset)));
        }
        self.chart_cache.as_ref().and_then(|(_, data)| data.as_ref())
    }

    /// Serializes the visible rows to CSV text.
    pub fn export_csv(&mut self) -> Result<String> {
        self.banners.clear();
        let result = self.build_export();
        if let Err(err) = &result {
            self.banners.record(err);
        }
        result
    }

    /// Writes the export to `path` (`-` for stdout). Returns the number of data rows written.
    pub fn export_to(&mut self, path: &Path) -> Result<usize> {
        let text = self.export_csv()?;
        let rows = self.visible_rows().len();
        if let Err(err) = io_utils::write_output(path, text.as_bytes()) {
            let err = GlanceError::Export(format!("{err:#}"));
            self.banners.record(&err);
            return Err(err);
        }
        info!("Exported {rows} row(s) to {path:?}");
        Ok(rows)
    }

    fn build_export(&mut self) -> Result<String> {
        let columns = match self.table.dataset() {
            Some(dataset) if !dataset.is_empty() => dataset.columns().to_vec(),
            _ => return Err(GlanceError::Selection(NO_SELECTION_MESSAGE.to_string())),
        };
        let rows = self.visible_rows();
        export::export_csv(rows, &columns)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn session_with(contents: &str) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, contents).unwrap();
        let mut session = Session::default();
        session.select(path.to_str().unwrap()).unwrap();
        (dir, session)
    }

    #[test]
    fn select_loads_both_consumers() {
        let (_dir, mut session) = session_with("name,price\nApple,1.5\nBanana,abc\n");
        assert_eq!(session.dataset().unwrap().len(), 2);
        assert!(matches!(session.chart_state(), IngestState::Ready(_)));
        let chart = session.chart().unwrap();
        assert_eq!(chart.series[0].values, vec![Some(1.5), None]);
        assert!(session.banners().is_empty());
    }

    #[test]
    fn export_without_dataset_is_selection_error() {
        let mut session = Session::default();
        let err = session.export_csv().unwrap_err();
        assert_eq!(err, GlanceError::Selection(NO_SELECTION_MESSAGE.into()));
        assert_eq!(
            session.banners().selection.as_deref(),
            Some(NO_SELECTION_MESSAGE)
        );
    }

    #[test]
    fn export_follows_filter_and_sort() {
        let (_dir, mut session) = session_with("name,qty\npear,3\nkiwi,1\nplum,2\n");
        session.set_filter("p");
        session.toggle_sort("qty");
        let text = session.export_csv().unwrap();
        assert_eq!(text, "name,qty\nplum,2\npear,3\n");
    }

    #[test]
    fn invalid_selection_keeps_previous_dataset() {
        let (_dir, mut session) = session_with("a\n1\n");
        assert!(session.select("notes.txt").is_err());
        assert!(session.banners().selection.is_some());
        assert_eq!(session.dataset().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_sets_fetch_banner_and_clears_data() {
        let (dir, mut session) = session_with("a\n1\n");
        let missing = dir.path().join("missing.csv");
        let err = session.select(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, GlanceError::Fetch(_)));
        assert!(session.banners().fetch.is_some());
        assert!(session.dataset().is_none());
        assert!(session.chart().is_none());
        assert!(session.visible_rows().is_empty());
    }

    #[test]
    fn visible_rows_are_memoized() {
        let (_dir, mut session) = session_with("a\n1\n2\n");
        assert_eq!(session.visible_rows().len(), 2);
        assert_eq!(session.visible_rows().len(), 2);
        assert_eq!(session.view_recomputations(), 1);
        session.set_filter("2");
        assert_eq!(session.visible_rows().len(), 1);
        assert_eq!(session.view_recomputations(), 2);
    }
}
