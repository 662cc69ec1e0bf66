use std::fmt;

use serde::Serialize;

use super::reconciler::CreatedRows;

/// A page that was not imported, or only partly imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    pub page: u32,
    pub reason: String,
}

/// What an import run did, printed once the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub pages_found: usize,
    pub pages_processed: usize,
    pub records_imported: usize,
    pub tenancies_already_present: usize,
    pub created: CreatedRows,
    pub skipped: Vec<SkippedPage>,
    pub interrupted: bool,
}

impl ImportSummary {
    pub fn records_skipped(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Property list import summary")?;
        writeln!(
            f,
            "- Pages: {} found | {} processed",
            self.pages_found, self.pages_processed
        )?;
        writeln!(
            f,
            "- Records: {} imported | {} already present | {} skipped",
            self.records_imported,
            self.tenancies_already_present,
            self.records_skipped()
        )?;
        writeln!(
            f,
            "- Created: {} landlords | {} properties | {} tenants | {} tenancies | {} checklist items",
            self.created.landlords,
            self.created.properties,
            self.created.tenants,
            self.created.tenancies,
            self.created.checklist_items
        )?;
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped pages:")?;
            for skipped in &self.skipped {
                writeln!(f, "  - page {}: {}", skipped.page, skipped.reason)?;
            }
        }
        if self.interrupted {
            writeln!(f, "Run interrupted; committed pages were kept.")?;
        }
        Ok(())
    }
}
