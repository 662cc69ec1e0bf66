//! Field extraction for one page of the property list export.
//!
//! Rules run in this order, each independent of the others except where an
//! earlier result bounds a later search:
//!
//! 1. property address (`PROPERTY` .. `MANAGEMENT`), then postcode inside it
//! 2. management fee (`MANAGEMENT` section)
//! 3. financial figures, searched from the end of the `LANDLORD` marker
//! 4. landlord block (`LANDLORD` .. first contact/bank/tenant marker or the
//!    figures), split into name and address
//! 5. landlord phone, mobile, e-mail (`LANDLORD` .. `TENANT`)
//! 6. bank name, account number, sort code
//! 7. tenant name and mobile (`TENANT` .. `DEPOSIT`)
//! 8. deposit holder, period, payment frequency
//! 9. checklist flags

pub(crate) mod anchors;
mod financials;
mod landlord;
mod rules;

pub use financials::{AmountOrder, UnknownAmountOrder};

use super::segmenter::SourcePage;
use crate::workflows::checklist::{checklist_flags, ChecklistFlag};
use serde::{Deserialize, Serialize};

/// Best-effort field bag for one page. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub page: u32,
    pub property_address: Option<String>,
    pub postcode: Option<String>,
    pub management_fee_percent: Option<f64>,
    pub landlord_name: Option<String>,
    pub landlord_address: Option<String>,
    pub landlord_phone: Option<String>,
    pub landlord_mobile: Option<String>,
    pub landlord_email: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub sort_code: Option<String>,
    pub tenant_name: Option<String>,
    pub tenant_mobile: Option<String>,
    /// Pounds, as printed.
    pub rent_amount: Option<f64>,
    /// Pounds, as printed.
    pub deposit_amount: Option<f64>,
    pub deposit_held_by: Option<String>,
    /// Raw `dd/mm/yyyy`.
    pub tenancy_start: Option<String>,
    /// Raw `dd/mm/yyyy`.
    pub tenancy_end: Option<String>,
    pub period_months: Option<u32>,
    pub payment_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<ChecklistFlag>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractor {
    amount_order: AmountOrder,
}

impl FieldExtractor {
    pub fn new(amount_order: AmountOrder) -> Self {
        Self { amount_order }
    }

    pub fn amount_order(&self) -> AmountOrder {
        self.amount_order
    }

    pub fn extract(&self, page: &SourcePage<'_>) -> ExtractedRecord {
        let text = page.text;
        let mut record = ExtractedRecord {
            page: page.number,
            ..ExtractedRecord::default()
        };

        if let Some(address) = rules::property_address(text) {
            record.postcode = rules::postcode(address.text);
            record.property_address = super::normalizer::sanitize_field(address.text);
        }
        record.management_fee_percent = rules::management_fee(text);

        let landlord_marker_end = anchors::find_from(text, anchors::landlord(), 0)
            .map(|(_, end)| end);
        let figures_from = landlord_marker_end.unwrap_or(0);
        let figures = financials::financials(text, figures_from, self.amount_order);

        if let Some(block) = landlord::landlord_block(text, figures.as_ref().map(|f| f.start)) {
            let (name, address) = landlord::split_name_and_address(block.text);
            record.landlord_name = name;
            record.landlord_address = address;
        }

        if let Some(region) = rules::landlord_contact_region(text) {
            record.landlord_phone = rules::landlord_phone(region.text);
            record.landlord_mobile = rules::marked_mobile(region.text);
            record.landlord_email = rules::landlord_email(region.text);
        }

        record.bank_name = rules::bank_name(text);
        record.bank_account_number = rules::bank_account_number(text);
        record.sort_code = rules::sort_code(text);

        if let Some(region) = rules::tenant_region(text) {
            record.tenant_name = rules::tenant_name(region.text);
            record.tenant_mobile = rules::tenant_mobile(region.text);
        }

        if let Some(figures) = figures {
            record.deposit_amount = figures.deposit;
            record.rent_amount = figures.rent;
            record.tenancy_start = Some(figures.tenancy_start);
            record.tenancy_end = Some(figures.tenancy_end);
        }

        record.deposit_held_by = rules::deposit_held_by(text);
        record.period_months = rules::period_months(text, figures_from);
        record.payment_frequency = rules::payment_frequency(text, figures_from);
        record.checklist = checklist_flags(text);

        tracing::debug!(
            page = page.number,
            address = record.property_address.as_deref().unwrap_or(""),
            landlord = record.landlord_name.as_deref().unwrap_or(""),
            tenant = record.tenant_name.as_deref().unwrap_or(""),
            "extracted page"
        );

        record
    }
}
