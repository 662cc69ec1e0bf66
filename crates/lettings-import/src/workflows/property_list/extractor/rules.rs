use super::anchors::{self, find_from, rest_of_line, section, Span};
use crate::workflows::property_list::normalizer::sanitize_field;
use regex::Regex;
use std::sync::OnceLock;

fn postcode_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z]{1,2}[0-9]{1,2}[A-Z]?) ?([0-9][A-Z]{2})\b")
            .expect("postcode pattern compiles")
    })
}

fn percentage_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^\d.])(\d{1,2}(?:\.\d{1,2})?)\s*(?:%|per\s?cent\b)")
            .expect("fee pattern compiles")
    })
}

fn landline_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t:.\-]*((?:\+44[ \t]?|0)\d{2,4}[ \t]?\d{3,4}[ \t]?\d{3,4})\b")
            .expect("landline pattern compiles")
    })
}

fn mobile_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+44[ \t]?7\d{3}|\b07\d{3})[ \t]?\d{3}[ \t]?\d{3}\b")
            .expect("mobile pattern compiles")
    })
}

fn account_digits_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t:.#]*(\d[\d \t]{4,10}\d)\b").expect("account pattern compiles")
    })
}

fn sort_code_digits_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t:.]*(\d{2})[-\s]?(\d{2})[-\s]?(\d{2})\b")
            .expect("sort code pattern compiles")
    })
}

fn deposit_holder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bdeposit\s+(?:held\s+by|holder|scheme)\b[ \t:]*([^\n]*)")
            .expect("deposit holder pattern compiles")
    })
}

fn period_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,3})\s*(?:months?|mths?)\b").expect("period pattern compiles")
    })
}

fn frequency_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(weekly|fortnightly|monthly|quarterly|annually|yearly|pcm|pw)\b")
            .expect("frequency pattern compiles")
    })
}

const VOID_TENANT_WORDS: &[&str] = &["vacant", "void", "none", "n/a", "-", "tbc"];

/// Property address: from `PROPERTY` up to, not including, the next
/// `MANAGEMENT` (or `LANDLORD`/`TENANT`/`BANK` when the fee line is missing).
pub(crate) fn property_address(text: &str) -> Option<Span<'_>> {
    section(
        text,
        anchors::property(),
        &[
            anchors::management(),
            anchors::landlord(),
            anchors::tenant(),
            anchors::bank(),
        ],
        0,
    )
}

/// UK postcode inside the already-extracted address. The last match wins so a
/// building name containing something postcode-shaped does not shadow it.
pub(crate) fn postcode(address: &str) -> Option<String> {
    postcode_pattern()
        .captures_iter(address)
        .last()
        .map(|captures| format!("{} {}", &captures[1], &captures[2]))
}

/// Management fee percentage from the `MANAGEMENT` section.
pub(crate) fn management_fee(text: &str) -> Option<f64> {
    let span = section(
        text,
        anchors::management(),
        &[anchors::landlord(), anchors::tenant(), anchors::property()],
        0,
    )?;
    percentage_pattern()
        .captures(span.text)
        .and_then(|captures| captures[1].parse::<f64>().ok())
}

/// From the `LANDLORD` marker to the `TENANT` marker: where landlord phone,
/// mobile and e-mail are looked for.
pub(crate) fn landlord_contact_region(text: &str) -> Option<Span<'_>> {
    section(text, anchors::landlord(), &[anchors::tenant()], 0)
}

/// Landline after a `TEL`/`PHONE` marker.
pub(crate) fn landlord_phone(region: &str) -> Option<String> {
    let (_, after) = find_from(region, anchors::telephone(), 0)?;
    landline_pattern()
        .captures(&region[after..])
        .and_then(|captures| sanitize_field(&captures[1]))
}

/// Mobile number after a `MOBILE` marker.
pub(crate) fn marked_mobile(region: &str) -> Option<String> {
    let (_, after) = find_from(region, anchors::mobile(), 0)?;
    mobile_number_pattern()
        .find(rest_of_line(region, after))
        .and_then(|found| sanitize_field(found.as_str()))
}

pub(crate) fn landlord_email(region: &str) -> Option<String> {
    anchors::email_address()
        .find(region)
        .and_then(|found| sanitize_field(found.as_str()))
}

/// Bank name: after `BANK`, up to `Acc No`, `SORT CODE` or the end of the line.
pub(crate) fn bank_name(text: &str) -> Option<String> {
    let span = section(
        text,
        anchors::bank(),
        &[anchors::account_number(), anchors::sort_code(), anchors::tenant()],
        0,
    )?;
    let trimmed = span.text.trim_start();
    let line = trimmed.split('\n').next().unwrap_or_default();
    sanitize_field(line)
}

/// Account number digits after `Acc No`.
pub(crate) fn bank_account_number(text: &str) -> Option<String> {
    let (_, after) = find_from(text, anchors::account_number(), 0)?;
    let captures = account_digits_pattern().captures(&text[after..])?;
    let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
    (6..=10).contains(&digits.len()).then_some(digits)
}

/// Sort code after `SORT CODE`, normalized to `NN-NN-NN`.
pub(crate) fn sort_code(text: &str) -> Option<String> {
    let (_, after) = find_from(text, anchors::sort_code(), 0)?;
    let captures = sort_code_digits_pattern().captures(&text[after..])?;
    Some(format!("{}-{}-{}", &captures[1], &captures[2], &captures[3]))
}

/// From the `TENANT` marker to the `DEPOSIT` line (or page end).
pub(crate) fn tenant_region(text: &str) -> Option<Span<'_>> {
    section(text, anchors::tenant(), &[anchors::deposit()], 0)
}

/// Tenant name: first line after `TENANT`, up to a contact marker or the first
/// digit-leading token. Void-period placeholders give `None`.
pub(crate) fn tenant_name(region: &str) -> Option<String> {
    let line = region.trim_start().split('\n').next().unwrap_or_default();
    let end = anchors::earliest_stop(
        line,
        &[
            anchors::mobile(),
            anchors::telephone(),
            anchors::email_marker(),
        ],
        0,
    )
    .unwrap_or(line.len());

    let name_tokens: Vec<&str> = line[..end]
        .split_whitespace()
        .take_while(|token| !token.starts_with(|c: char| c.is_ascii_digit() || c == '£'))
        .collect();
    let name = sanitize_field(&name_tokens.join(" "))?;

    if VOID_TENANT_WORDS.contains(&name.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(name)
    }
}

/// Tenant mobile: after a `MOBILE` marker, else the first mobile-shaped number.
pub(crate) fn tenant_mobile(region: &str) -> Option<String> {
    marked_mobile(region).or_else(|| {
        mobile_number_pattern()
            .find(region)
            .and_then(|found| sanitize_field(found.as_str()))
    })
}

/// Deposit holder or scheme text following `DEPOSIT HELD BY`.
pub(crate) fn deposit_held_by(text: &str) -> Option<String> {
    deposit_holder_pattern()
        .captures(text)
        .and_then(|captures| sanitize_field(&captures[1]))
}

/// Tenancy length in months, searched after the landlord marker so figures in
/// the address cannot leak in.
pub(crate) fn period_months(text: &str, from: usize) -> Option<u32> {
    period_pattern()
        .captures_at(text, from.min(text.len()))
        .and_then(|captures| captures[1].parse::<u32>().ok())
        .filter(|months| *months > 0)
}

pub(crate) fn payment_frequency(text: &str, from: usize) -> Option<String> {
    frequency_pattern()
        .captures_at(text, from.min(text.len()))
        .and_then(|captures| sanitize_field(&captures[1]))
}
