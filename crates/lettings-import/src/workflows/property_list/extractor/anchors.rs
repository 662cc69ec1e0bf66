//! Section markers printed in the property list export and helpers for
//! slicing a page between them.
//!
//! Markers are matched case-sensitively: the export prints them in capitals,
//! and lower-case words such as "Properties" inside a company name must not
//! open a new section.

use regex::Regex;
use std::sync::OnceLock;

macro_rules! anchor {
    ($fn_name:ident, $pattern:expr) => {
        pub(crate) fn $fn_name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("anchor pattern compiles"))
        }
    };
}

anchor!(property, r"\bPROPERTY(?:\s+ADDRESS)?\b:?");
anchor!(management, r"\bMANAGEMENT(?:\s+FEE)?\b:?");
anchor!(landlord, r"\bLANDLORD(?:\s+DETAILS)?\b:?");
anchor!(telephone, r"\b(?:TEL|PHONE|TELEPHONE)\b\.?:?");
anchor!(mobile, r"\b(?:MOBILE|MOB)\b\.?:?");
anchor!(email_marker, r"\bE-?MAIL\b:?");
anchor!(bank, r"\bBANK(?:\s+NAME)?\b:?");
anchor!(account_number, r"(?i)\bacc(?:ount)?\.?\s*(?:no|number)\b\.?:?");
anchor!(sort_code, r"(?i)\bsort\s*code\b:?");
anchor!(tenant, r"\bTENANTS?(?:\s+NAME)?\b:?");
anchor!(deposit, r"\bDEPOSIT\b");
anchor!(
    email_address,
    r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"
);

/// Start and end byte offsets of the first match of `marker` at or after `from`.
pub(crate) fn find_from(text: &str, marker: &Regex, from: usize) -> Option<(usize, usize)> {
    if from > text.len() {
        return None;
    }
    marker
        .find_at(text, from)
        .map(|found| (found.start(), found.end()))
}

/// Earliest start offset of any `stops` match at or after `from`.
pub(crate) fn earliest_stop(text: &str, stops: &[&Regex], from: usize) -> Option<usize> {
    stops
        .iter()
        .filter_map(|stop| find_from(text, stop, from).map(|(start, _)| start))
        .min()
}

/// A slice of the page together with its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span<'t> {
    pub(crate) start: usize,
    pub(crate) text: &'t str,
}

impl<'t> Span<'t> {
    pub(crate) fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Text following `start`, bounded by the earliest of `stops` (or the page end).
pub(crate) fn section<'t>(
    text: &'t str,
    start: &Regex,
    stops: &[&Regex],
    from: usize,
) -> Option<Span<'t>> {
    let (_, body_start) = find_from(text, start, from)?;
    let body_end = earliest_stop(text, stops, body_start).unwrap_or(text.len());
    Some(Span {
        start: body_start,
        text: &text[body_start..body_end],
    })
}

/// The remainder of the line containing `offset`.
pub(crate) fn rest_of_line(text: &str, offset: usize) -> &str {
    let tail = &text[offset.min(text.len())..];
    match tail.find('\n') {
        Some(newline) => &tail[..newline],
        None => tail,
    }
}
