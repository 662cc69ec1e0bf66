use super::flags::parse_completion;
use super::mapping::kind_for_label;
use crate::workflows::property_list::domain::NewChecklistItem;
use crate::workflows::property_list::normalizer::{address_key, sanitize_field};
use crate::workflows::property_list::repository::{LettingsRepository, RepositoryError};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ChecklistImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Repository(RepositoryError),
}

impl std::fmt::Display for ChecklistImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecklistImportError::Io(err) => write!(f, "failed to read checklist export: {}", err),
            ChecklistImportError::Csv(err) => write!(f, "invalid checklist CSV data: {}", err),
            ChecklistImportError::Repository(err) => {
                write!(f, "could not apply checklist rows: {}", err)
            }
        }
    }
}

impl std::error::Error for ChecklistImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChecklistImportError::Io(err) => Some(err),
            ChecklistImportError::Csv(err) => Some(err),
            ChecklistImportError::Repository(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ChecklistImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ChecklistImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<RepositoryError> for ChecklistImportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

#[derive(Debug, Deserialize)]
struct ChecklistRow {
    #[serde(rename = "Property Address")]
    property_address: String,
    #[serde(rename = "Item")]
    item: String,
    #[serde(rename = "Completed", default, deserialize_with = "empty_string_as_none")]
    completed: Option<String>,
    #[serde(rename = "Document", default, deserialize_with = "empty_string_as_none")]
    document: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// A CSV row that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedRow {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub property_address: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistImportSummary {
    pub rows_read: usize,
    pub items_created: usize,
    pub items_updated: usize,
    pub items_unchanged: usize,
    pub unmatched: Vec<UnmatchedRow>,
}

impl std::fmt::Display for ChecklistImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Checklist import summary")?;
        writeln!(
            f,
            "- Rows: {} read | {} created | {} completed | {} unchanged | {} unmatched",
            self.rows_read,
            self.items_created,
            self.items_updated,
            self.items_unchanged,
            self.unmatched.len()
        )?;
        for unmatched in &self.unmatched {
            writeln!(
                f,
                "  - row {} ({}): {}",
                unmatched.row, unmatched.property_address, unmatched.reason
            )?;
        }
        Ok(())
    }
}

enum RowEffect {
    Created,
    Completed,
    Unchanged,
}

/// Applies a checklist CSV export to the latest tenancy of each property.
pub struct ChecklistCsvImporter;

impl ChecklistCsvImporter {
    pub fn from_path<P, R>(path: P, repository: &R) -> Result<ChecklistImportSummary, ChecklistImportError>
    where
        P: AsRef<Path>,
        R: LettingsRepository + ?Sized,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, repository)
    }

    pub fn from_reader<Rd, R>(reader: Rd, repository: &R) -> Result<ChecklistImportSummary, ChecklistImportError>
    where
        Rd: Read,
        R: LettingsRepository + ?Sized,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut summary = ChecklistImportSummary::default();

        for (index, record) in csv_reader.deserialize::<ChecklistRow>().enumerate() {
            let row = record?;
            summary.rows_read += 1;
            let row_number = index + 1;

            match apply_row(&row, repository)? {
                Ok(RowEffect::Created) => summary.items_created += 1,
                Ok(RowEffect::Completed) => summary.items_updated += 1,
                Ok(RowEffect::Unchanged) => summary.items_unchanged += 1,
                Err(reason) => {
                    tracing::warn!(row = row_number, reason, "checklist row not applied");
                    summary.unmatched.push(UnmatchedRow {
                        row: row_number,
                        property_address: row.property_address.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }
}

/// Outer error is storage failure; inner error is a per-row reason.
fn apply_row<R>(
    row: &ChecklistRow,
    repository: &R,
) -> Result<Result<RowEffect, &'static str>, RepositoryError>
where
    R: LettingsRepository + ?Sized,
{
    let Some(kind) = kind_for_label(&row.item) else {
        return Ok(Err("unknown checklist item"));
    };
    let completed = match row.completed.as_deref() {
        None => true,
        Some(flag) => match parse_completion(flag) {
            Some(completed) => completed,
            None => return Ok(Err("unrecognized completion value")),
        },
    };
    let Some(address) = sanitize_field(&row.property_address) else {
        return Ok(Err("missing property address"));
    };
    let Some(property) = repository.find_property_by_address(&address_key(&address))? else {
        return Ok(Err("unknown property"));
    };
    let Some(tenancy) = repository.latest_tenancy_for_property(property)? else {
        return Ok(Err("property has no tenancy"));
    };
    let document_ref = row.document.as_deref().and_then(sanitize_field);

    match repository.find_checklist_item(tenancy, kind)? {
        Some(existing) if completed && !existing.completed => {
            repository.complete_checklist_item(existing.id, document_ref.as_deref())?;
            Ok(Ok(RowEffect::Completed))
        }
        Some(_) => Ok(Ok(RowEffect::Unchanged)),
        None => {
            repository.insert_checklist_item(&NewChecklistItem {
                tenancy_id: tenancy,
                kind,
                completed,
                document_ref,
            })?;
            Ok(Ok(RowEffect::Created))
        }
    }
}
