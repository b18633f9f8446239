//! Source ingestion state machine.
//!
//! Each ingestion attempt is tagged with a generation. Only the result
//! carrying the current generation is committed, so a superseded load or a
//! detached consumer never overwrites newer state.

use encoding_rs::Encoding;
use log::{debug, warn};

use crate::{
    data::Dataset,
    error::{GlanceError, Result},
    io_utils::Source,
    parse::parse_csv,
    sanitize::{SanitizeTarget, sanitize},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum IngestState {
    #[default]
    Idle,
    Loading,
    Ready(Dataset),
    FetchFailed(String),
    ParseFailed(String),
}

/// Proof of which attempt a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Ingestion {
    target: SanitizeTarget,
    state: IngestState,
    generation: u64,
}

impl Ingestion {
    pub fn new(target: SanitizeTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &IngestState {
        &self.state
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.state {
            IngestState::Ready(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, IngestState::Loading)
    }

    /// Starts a new attempt, clearing any previous result or error.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = IngestState::Loading;
        debug!(
            "Ingestion ({:?}) started generation {}",
            self.target, self.generation
        );
        Ticket(self.generation)
    }

    /// Drops interest in any in-flight attempt and returns to idle.
    pub fn detach(&mut self) {
        self.generation += 1;
        self.state = IngestState::Idle;
        debug!(
            "Ingestion ({:?}) detached at generation {}",
            self.target, self.generation
        );
    }

    /// Applies fetched text (or the fetch failure) for `ticket`.
    ///
    /// Returns `false` without touching state when the ticket is stale.
    pub fn complete(&mut self, ticket: Ticket, fetched: Result<String>) -> bool {
        if ticket.0 != self.generation {
            debug!(
                "Discarding stale result for generation {} (current {})",
                ticket.0, self.generation
            );
            return false;
        }
        let outcome = fetched.and_then(|text| self.build_dataset(&text, ticket));
        self.state = match outcome {
            Ok(dataset) => IngestState::Ready(dataset),
            Err(GlanceError::Parse(message)) => IngestState::ParseFailed(message),
            Err(GlanceError::Fetch(message)) => IngestState::FetchFailed(message),
            Err(other) => IngestState::FetchFailed(other.to_string()),
        };
        true
    }

    /// Fetches and parses `source` synchronously.
    pub fn load(&mut self, source: &Source, encoding: &'static Encoding) -> Result<&Dataset> {
        let ticket = self.begin();
        let fetched = source.fetch(encoding);
        self.complete(ticket, fetched);
        match &self.state {
            IngestState::Ready(dataset) => {
                debug!(
                    "Loaded {} row(s) across {} column(s) from {}",
                    dataset.len(),
                    dataset.columns().len(),
                    source
                );
                Ok(dataset)
            }
            IngestState::ParseFailed(message) => {
                warn!("Parsing {source} failed: {message}");
                Err(GlanceError::Parse(message.clone()))
            }
            IngestState::FetchFailed(message) => {
                warn!("Reading {source} failed: {message}");
                Err(GlanceError::Fetch(message.clone()))
            }
            IngestState::Idle | IngestState::Loading => Err(GlanceError::Fetch(format!(
                "Load of {source} did not complete"
            ))),
        }
    }

    fn build_dataset(&self, text: &str, ticket: Ticket) -> Result<Dataset> {
        let parsed = parse_csv(text)?;
        let records = parsed
            .records
            .into_iter()
            .map(|raw| sanitize(raw, self.target))
            .collect();
        Ok(Dataset::new(parsed.headers, records, ticket.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_parse_becomes_ready() {
        let mut ingestion = Ingestion::new(SanitizeTarget::Display);
        assert_eq!(ingestion.state(), &IngestState::Idle);
        let ticket = ingestion.begin();
        assert!(ingestion.is_loading());
        assert!(ingestion.complete(ticket, Ok("a,b\n1,2\n".into())));
        let dataset = ingestion.dataset().unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.revision(), ticket.generation());
    }

    #[test]
    fn fetch_and_parse_failures_are_terminal_states() {
        let mut ingestion = Ingestion::new(SanitizeTarget::Display);
        let ticket = ingestion.begin();
        ingestion.complete(ticket, Err(GlanceError::Fetch("HTTP 404 Not Found".into())));
        match ingestion.state() {
            IngestState::FetchFailed(message) => assert!(message.contains("404")),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(ingestion.dataset().is_none());

        let ticket = ingestion.begin();
        ingestion.complete(ticket, Ok("a,b\n1\n".into()));
        assert!(matches!(ingestion.state(), IngestState::ParseFailed(_)));
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut ingestion = Ingestion::new(SanitizeTarget::Display);
        let first = ingestion.begin();
        let second = ingestion.begin();
        assert!(!ingestion.complete(first, Ok("old\n1\n".into())));
        assert!(ingestion.is_loading());
        assert!(ingestion.complete(second, Ok("new\n2\n".into())));
        assert_eq!(ingestion.dataset().unwrap().columns(), &["new".to_string()]);
        assert!(!ingestion.complete(first, Ok("old\n1\n".into())));
        assert_eq!(ingestion.dataset().unwrap().columns(), &["new".to_string()]);
    }

    #[test]
    fn detach_suppresses_in_flight_result() {
        let mut ingestion = Ingestion::new(SanitizeTarget::Chart);
        let ticket = ingestion.begin();
        ingestion.detach();
        assert!(!ingestion.complete(ticket, Ok("a\n1\n".into())));
        assert_eq!(ingestion.state(), &IngestState::Idle);
    }

    #[test]
    fn new_selection_clears_previous_dataset() {
        let mut ingestion = Ingestion::new(SanitizeTarget::Display);
        let ticket = ingestion.begin();
        ingestion.complete(ticket, Ok("a\n1\n".into()));
        assert!(ingestion.dataset().is_some());
        ingestion.begin();
        assert!(ingestion.dataset().is_none());
    }
}
