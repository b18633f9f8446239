//! Error categories surfaced to the user.
//!
//! Every failure in the pipeline falls into one of four independent
//! categories. None of them is fatal: the caller records the message and the
//! user can always select another source.

use thiserror::Error;

pub type Result<T, E = GlanceError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GlanceError {
    /// No source, or a source that is not a CSV file.
    #[error("{0}")]
    Selection(String),
    /// The source could not be read or downloaded.
    #[error("Failed to fetch CSV: {0}")]
    Fetch(String),
    /// The parser reported row-level errors.
    #[error("Failed to parse CSV: {0}")]
    Parse(String),
    /// Serializing or writing the export failed.
    #[error("Failed to export CSV: {0}")]
    Export(String),
}

impl GlanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GlanceError::Selection(_) => ErrorKind::Selection,
            GlanceError::Fetch(_) => ErrorKind::Fetch,
            GlanceError::Parse(_) => ErrorKind::Parse,
            GlanceError::Export(_) => ErrorKind::Export,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Selection,
    Fetch,
    Parse,
    Export,
}

/// The four inline error banners. At most one message per category is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBanners {
    pub selection: Option<String>,
    pub fetch: Option<String>,
    pub parse: Option<String>,
    pub export: Option<String>,
}

impl ErrorBanners {
    pub fn clear(&mut self) {
        *self = ErrorBanners::default();
    }

    pub fn record(&mut self, error: &GlanceError) {
        let message = Some(error.to_string());
        match error.kind() {
            ErrorKind::Selection => self.selection = message,
            ErrorKind::Fetch => self.fetch = message,
            ErrorKind::Parse => self.parse = message,
            ErrorKind::Export => self.export = message,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages().next().is_none()
    }

    /// Active messages in banner order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        [&self.selection, &self.fetch, &self.parse, &self.export]
            .into_iter()
            .filter_map(|slot| slot.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_places_message_in_matching_banner() {
        let mut banners = ErrorBanners::default();
        banners.record(&GlanceError::Fetch("HTTP 404 Not Found".into()));
        assert_eq!(
            banners.fetch.as_deref(),
            Some("Failed to fetch CSV: HTTP 404 Not Found")
        );
        assert!(banners.selection.is_none());
        assert!(banners.parse.is_none());
        assert!(banners.export.is_none());
    }

    #[test]
    fn clear_drops_every_category() {
        let mut banners = ErrorBanners::default();
        banners.record(&GlanceError::Selection("Please upload a CSV file first.".into()));
        banners.record(&GlanceError::Export("disk full".into()));
        assert_eq!(banners.messages().count(), 2);
        banners.clear();
        assert!(banners.is_empty());
    }
}
