//! Property list import: segment the text export into pages, extract fields
//! per page, reconcile landlords, properties and tenants, then write
//! tenancies and checklist items one page at a time.

pub mod domain;
pub mod extractor;
pub mod normalizer;
pub mod reconciler;
pub mod report;
pub mod repository;
pub mod run;
pub mod segmenter;
pub mod writer;

pub use extractor::{AmountOrder, ExtractedRecord, FieldExtractor, UnknownAmountOrder};
pub use reconciler::{CreatedRows, IdentityCache};
pub use report::{ImportSummary, SkippedPage};
pub use repository::{InMemoryLettingsRepository, LettingsRepository, RepositoryError};
pub use run::{ImportRun, PageOutcome, RunOptions, SkipReason};
pub use segmenter::{PageSegmenter, SourcePage};

use std::path::Path;
use std::sync::atomic::AtomicBool;

use crate::config::ImportConfig;

#[derive(Debug, thiserror::Error)]
pub enum PropertyListImportError {
    #[error("failed to read property list: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid page marker pattern: {0}")]
    InvalidMarker(#[from] regex::Error),
    #[error("no pages found using marker '{marker}'; check the source file and IMPORT_PAGE_MARKER")]
    NoPages { marker: String },
}

/// Entry point tying the pipeline stages together for one source document.
#[derive(Debug, Clone)]
pub struct PropertyListImporter {
    marker: String,
    segmenter: PageSegmenter,
    extractor: FieldExtractor,
    preview_count: usize,
}

impl PropertyListImporter {
    pub fn new(config: &ImportConfig) -> Result<Self, PropertyListImportError> {
        Ok(Self {
            marker: config.page_marker.clone(),
            segmenter: PageSegmenter::new(&config.page_marker, config.min_page_chars)?,
            extractor: FieldExtractor::new(config.amount_order),
            preview_count: config.preview_count,
        })
    }

    pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String, PropertyListImportError> {
        let text = std::fs::read_to_string(path)?;
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }

    pub fn extractor(&self) -> FieldExtractor {
        self.extractor
    }

    /// Qualifying page count; zero pages is a configuration error.
    pub fn count_pages(&self, text: &str) -> Result<usize, PropertyListImportError> {
        match self.segmenter.count(text) {
            0 => Err(PropertyListImportError::NoPages {
                marker: self.marker.clone(),
            }),
            found => Ok(found),
        }
    }

    /// Extract the first configured number of pages without touching storage,
    /// so an operator can check field boundaries and the amount order.
    pub fn preview(&self, text: &str) -> Result<Vec<ExtractedRecord>, PropertyListImportError> {
        self.preview_n(text, self.preview_count)
    }

    pub fn preview_n(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<ExtractedRecord>, PropertyListImportError> {
        self.count_pages(text)?;
        Ok(self
            .segmenter
            .pages(text)
            .take(limit)
            .map(|page| self.extractor.extract(&page))
            .collect())
    }

    pub fn import<R>(
        &self,
        repository: &R,
        text: &str,
        options: RunOptions,
    ) -> Result<ImportSummary, PropertyListImportError>
    where
        R: LettingsRepository + ?Sized,
    {
        self.import_with_cancel(repository, text, options, &AtomicBool::new(false))
    }

    pub fn import_with_cancel<R>(
        &self,
        repository: &R,
        text: &str,
        options: RunOptions,
        cancel: &AtomicBool,
    ) -> Result<ImportSummary, PropertyListImportError>
    where
        R: LettingsRepository + ?Sized,
    {
        let pages_found = self.count_pages(text)?;
        tracing::info!(pages_found, amount_order = %self.extractor.amount_order(), "starting import");

        let summary = ImportRun::new(repository, self.extractor, options)
            .with_pages_found(pages_found)
            .run(self.segmenter.pages(text), cancel);

        tracing::info!(
            pages_processed = summary.pages_processed,
            imported = summary.records_imported,
            skipped = summary.records_skipped(),
            interrupted = summary.interrupted,
            "import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer() -> PropertyListImporter {
        PropertyListImporter::new(&ImportConfig {
            preview_count: 1,
            ..ImportConfig::default()
        })
        .expect("importer")
    }

    #[test]
    fn invalid_marker_is_fatal() {
        let config = ImportConfig {
            page_marker: "=== Page (".to_string(),
            ..ImportConfig::default()
        };
        assert!(matches!(
            PropertyListImporter::new(&config),
            Err(PropertyListImportError::InvalidMarker(_))
        ));
    }

    #[test]
    fn zero_pages_is_fatal() {
        let repository = InMemoryLettingsRepository::new();
        let options = RunOptions {
            as_of: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
        };
        let error = importer()
            .import(&repository, "PROPERTY 10 Elm Road W9 1AB with no markers", options)
            .expect_err("no pages");
        assert!(matches!(error, PropertyListImportError::NoPages { .. }));
    }

    #[test]
    fn preview_respects_limit_and_writes_nothing() {
        let text = "=== Page 1 ===\nPROPERTY 10 Elm Road W9 1AB\nLANDLORD Mr John Smith\n\
=== Page 2 ===\nPROPERTY 12 Elm Road W9 1AB\nLANDLORD Mr John Smith\n";
        let preview = importer().preview(text).expect("preview");
        assert_eq!(preview.len(), 1);
        assert_eq!(preview[0].postcode.as_deref(), Some("W9 1AB"));
    }
}
