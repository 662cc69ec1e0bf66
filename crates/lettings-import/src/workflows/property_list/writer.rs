use chrono::NaiveDate;

use super::domain::{
    DepositScheme, LandlordId, NewChecklistItem, NewTenancy, PaymentFrequency, PropertyId,
    TenancyId, TenancyStatus, TenantId,
};
use super::extractor::ExtractedRecord;
use super::reconciler::CreatedRows;
use super::repository::{LettingsRepository, RepositoryError};

const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a `dd/mm/yyyy` date as printed in the export.
pub fn parse_source_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), SOURCE_DATE_FORMAT).ok()
}

pub fn format_source_date(date: NaiveDate) -> String {
    date.format(SOURCE_DATE_FORMAT).to_string()
}

/// Pounds to integer pence. The only place the unit changes.
pub fn pounds_to_pence(pounds: f64) -> Option<i64> {
    let pence = (pounds * 100.0).round();
    (pence.is_finite() && pence >= 0.0 && pence <= i64::MAX as f64).then_some(pence as i64)
}

/// Ids the reconciler resolved for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIds {
    pub property: PropertyId,
    pub landlord: LandlordId,
    pub tenant: Option<TenantId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenancyWrite {
    Inserted(TenancyId),
    /// Same property and start date already stored; nothing written.
    AlreadyPresent(TenancyId),
}

fn page_date(record: &ExtractedRecord, field: &'static str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    let parsed = parse_source_date(raw);
    if parsed.is_none() {
        tracing::warn!(page = record.page, field, value = raw, "unparseable date stored as null");
    }
    parsed
}

/// Build the tenancy row for a page. Amounts become pence here.
pub fn tenancy_row(record: &ExtractedRecord, ids: ResolvedIds, as_of: NaiveDate) -> NewTenancy {
    let start_date = page_date(record, "tenancy_start", record.tenancy_start.as_deref());
    let end_date = page_date(record, "tenancy_end", record.tenancy_end.as_deref());

    NewTenancy {
        property_id: ids.property,
        landlord_id: ids.landlord,
        tenant_id: ids.tenant,
        rent_pence: record.rent_amount.and_then(pounds_to_pence),
        rent_frequency: record
            .payment_frequency
            .as_deref()
            .and_then(PaymentFrequency::parse),
        deposit_pence: record.deposit_amount.and_then(pounds_to_pence),
        deposit_scheme: record.deposit_held_by.as_deref().map(DepositScheme::classify),
        deposit_held_by: record.deposit_held_by.clone(),
        start_date,
        end_date,
        period_months: record.period_months,
        status: TenancyStatus::derive(end_date, as_of),
        source_page: record.page,
    }
}

/// Persist the tenancy and its checklist items unless the same period is
/// already stored.
pub fn write_tenancy<R>(
    repository: &R,
    record: &ExtractedRecord,
    ids: ResolvedIds,
    as_of: NaiveDate,
    created: &mut CreatedRows,
) -> Result<TenancyWrite, RepositoryError>
where
    R: LettingsRepository + ?Sized,
{
    let row = tenancy_row(record, ids, as_of);

    if let Some(existing) = repository.find_tenancy(row.property_id, row.start_date)? {
        tracing::info!(
            page = record.page,
            tenancy_id = %existing,
            property_id = %row.property_id,
            "tenancy period already imported"
        );
        return Ok(TenancyWrite::AlreadyPresent(existing));
    }

    let tenancy = repository.insert_tenancy(&row)?;
    created.tenancies += 1;

    for flag in &record.checklist {
        repository.insert_checklist_item(&NewChecklistItem {
            tenancy_id: tenancy,
            kind: flag.kind,
            completed: flag.completed,
            document_ref: flag.document_ref.clone(),
        })?;
        created.checklist_items += 1;
    }

    Ok(TenancyWrite::Inserted(tenancy))
}
