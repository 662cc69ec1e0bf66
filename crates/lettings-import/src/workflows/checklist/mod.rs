//! Compliance checklist items: flags printed on property list pages and the
//! standalone checklist CSV export.

mod csv_import;
mod flags;
mod mapping;

pub use csv_import::{
    ChecklistCsvImporter, ChecklistImportError, ChecklistImportSummary, UnmatchedRow,
};
pub use flags::ChecklistFlag;

pub(crate) use flags::checklist_flags;
