use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;

use super::domain::TenancyId;
use super::extractor::{ExtractedRecord, FieldExtractor};
use super::reconciler::{resolve_landlord, resolve_property, resolve_tenant, CreatedRows, IdentityCache};
use super::report::{ImportSummary, SkippedPage};
use super::repository::{LettingsRepository, RepositoryError};
use super::segmenter::SourcePage;
use super::writer::{write_tenancy, ResolvedIds, TenancyWrite};

/// Why a page did not produce a tenancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingPropertyAddress,
    /// The property row was still written.
    MissingLandlordName,
    Storage(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingPropertyAddress => write!(f, "missing property address"),
            SkipReason::MissingLandlordName => write!(f, "missing landlord name"),
            SkipReason::Storage(detail) => write!(f, "storage error: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Imported(TenancyId),
    AlreadyImported(TenancyId),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Date tenancy status is derived against.
    pub as_of: NaiveDate,
}

/// One execution of the import pipeline: the storage handle, the identity
/// cache built up across pages, and the running summary.
pub struct ImportRun<'r, R: LettingsRepository + ?Sized> {
    repository: &'r R,
    extractor: FieldExtractor,
    cache: IdentityCache,
    options: RunOptions,
    summary: ImportSummary,
}

impl<'r, R: LettingsRepository + ?Sized> ImportRun<'r, R> {
    pub fn new(repository: &'r R, extractor: FieldExtractor, options: RunOptions) -> Self {
        Self {
            repository,
            extractor,
            cache: IdentityCache::new(),
            options,
            summary: ImportSummary::default(),
        }
    }

    pub fn with_pages_found(mut self, pages_found: usize) -> Self {
        self.summary.pages_found = pages_found;
        self
    }

    /// Process pages in order until they run out or `cancel` is set. The flag
    /// is checked between pages only.
    pub fn run<'t, I>(mut self, pages: I, cancel: &AtomicBool) -> ImportSummary
    where
        I: IntoIterator<Item = SourcePage<'t>>,
    {
        for page in pages {
            if cancel.load(Ordering::SeqCst) {
                tracing::warn!(
                    next_page = page.number,
                    processed = self.summary.pages_processed,
                    "import interrupted"
                );
                self.summary.interrupted = true;
                break;
            }
            self.process_page(&page);
        }
        self.finish()
    }

    pub fn process_page(&mut self, page: &SourcePage<'_>) -> PageOutcome {
        let record = self.extractor.extract(page);
        self.process_record(&record)
    }

    pub fn process_record(&mut self, record: &ExtractedRecord) -> PageOutcome {
        self.summary.pages_processed += 1;
        let outcome = self.apply(record);

        match &outcome {
            PageOutcome::Imported(tenancy) => {
                self.summary.records_imported += 1;
                tracing::info!(page = record.page, tenancy_id = %tenancy, "imported page");
            }
            PageOutcome::AlreadyImported(_) => {
                self.summary.tenancies_already_present += 1;
            }
            PageOutcome::Skipped(reason) => {
                tracing::warn!(page = record.page, reason = %reason, "skipped page");
                self.summary.skipped.push(SkippedPage {
                    page: record.page,
                    reason: reason.to_string(),
                });
            }
        }

        outcome
    }

    pub fn finish(self) -> ImportSummary {
        self.summary
    }

    fn apply(&mut self, record: &ExtractedRecord) -> PageOutcome {
        if record.property_address.is_none() {
            return PageOutcome::Skipped(SkipReason::MissingPropertyAddress);
        }
        if let Err(err) = self.repository.begin() {
            return PageOutcome::Skipped(SkipReason::Storage(err.to_string()));
        }

        let mut created = CreatedRows::default();
        let written = self
            .write_page(record, &mut created)
            .and_then(|outcome| self.repository.commit().map(|()| outcome));

        match written {
            Ok(outcome) => {
                self.cache.commit_page();
                self.summary.created.absorb(created);
                outcome
            }
            Err(err) => {
                if let Err(rollback) = self.repository.rollback() {
                    tracing::error!(page = record.page, error = %rollback, "rollback failed");
                }
                self.cache.discard_page();
                PageOutcome::Skipped(SkipReason::Storage(err.to_string()))
            }
        }
    }

    fn write_page(
        &mut self,
        record: &ExtractedRecord,
        created: &mut CreatedRows,
    ) -> Result<PageOutcome, RepositoryError> {
        let landlord = resolve_landlord(self.repository, &mut self.cache, record, created)?;
        let Some(property) =
            resolve_property(self.repository, &mut self.cache, record, landlord, created)?
        else {
            return Ok(PageOutcome::Skipped(SkipReason::MissingPropertyAddress));
        };
        let Some(landlord) = landlord else {
            return Ok(PageOutcome::Skipped(SkipReason::MissingLandlordName));
        };
        let tenant = resolve_tenant(self.repository, &mut self.cache, record, created)?;

        let ids = ResolvedIds {
            property,
            landlord,
            tenant,
        };
        Ok(
            match write_tenancy(self.repository, record, ids, self.options.as_of, created)? {
                TenancyWrite::Inserted(id) => PageOutcome::Imported(id),
                TenancyWrite::AlreadyPresent(id) => PageOutcome::AlreadyImported(id),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::property_list::extractor::AmountOrder;
    use crate::workflows::property_list::repository::InMemoryLettingsRepository;

    fn options() -> RunOptions {
        RunOptions {
            as_of: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
        }
    }

    fn record(page: u32, address: Option<&str>, landlord: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            page,
            property_address: address.map(str::to_string),
            landlord_name: landlord.map(str::to_string),
            tenancy_start: Some("01/01/2024".to_string()),
            ..ExtractedRecord::default()
        }
    }

    #[test]
    fn address_only_record_keeps_property_and_reports_skip() {
        let repository = InMemoryLettingsRepository::new();
        let mut run = ImportRun::new(&repository, FieldExtractor::default(), options());

        let outcome = run.process_record(&record(1, Some("3 Ash Close N1 2AA"), None));

        assert_eq!(outcome, PageOutcome::Skipped(SkipReason::MissingLandlordName));
        let counts = repository.counts().expect("counts");
        assert_eq!(counts.properties, 1);
        assert_eq!(counts.landlords, 0);
        assert_eq!(counts.tenancies, 0);
        let summary = run.finish();
        assert_eq!(summary.created.properties, 1);
        assert_eq!(summary.skipped[0].reason, "missing landlord name");
    }

    #[test]
    fn record_without_address_writes_nothing() {
        let repository = InMemoryLettingsRepository::new();
        let mut run = ImportRun::new(&repository, FieldExtractor::default(), options());

        let outcome = run.process_record(&record(2, None, Some("Mr John Smith")));

        assert_eq!(outcome, PageOutcome::Skipped(SkipReason::MissingPropertyAddress));
        assert_eq!(repository.counts().expect("counts"), Default::default());
    }

    #[test]
    fn cancelled_run_stops_before_next_page() {
        let repository = InMemoryLettingsRepository::new();
        let cancel = AtomicBool::new(true);
        let pages = vec![SourcePage {
            number: 1,
            text: "PROPERTY 10 Elm Road W9 1AB\nLANDLORD Mr John Smith",
        }];

        let summary = ImportRun::new(&repository, FieldExtractor::new(AmountOrder::DepositFirst), options())
            .with_pages_found(1)
            .run(pages, &cancel);

        assert!(summary.interrupted);
        assert_eq!(summary.pages_found, 1);
        assert_eq!(summary.pages_processed, 0);
        assert_eq!(repository.counts().expect("counts").properties, 0);
    }

    #[test]
    fn reimporting_a_page_reports_existing_tenancy() {
        let repository = InMemoryLettingsRepository::new();
        let page = record(1, Some("10 Elm Road W9 1AB"), Some("Mr John Smith"));

        let mut first = ImportRun::new(&repository, FieldExtractor::default(), options());
        assert!(matches!(first.process_record(&page), PageOutcome::Imported(_)));

        let mut second = ImportRun::new(&repository, FieldExtractor::default(), options());
        assert!(matches!(second.process_record(&page), PageOutcome::AlreadyImported(_)));
        let summary = second.finish();
        assert_eq!(summary.tenancies_already_present, 1);
        assert_eq!(summary.created, CreatedRows::default());
    }
}
