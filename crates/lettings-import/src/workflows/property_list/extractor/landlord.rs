use super::anchors::{self, earliest_stop, Span};
use crate::workflows::property_list::domain::is_company_keyword;
use crate::workflows::property_list::normalizer::sanitize_field;

/// Words that end a street name. Abbreviations that double as titles or
/// saints (`Dr`, `St`) are left out on purpose.
const STREET_TYPES: &[&str] = &[
    "road", "rd", "street", "avenue", "ave", "close", "lane", "drive", "way", "place",
    "crescent", "gardens", "grove", "terrace", "square", "mews", "parade",
];

/// Words that open an address without a leading house number.
const ADDRESS_LEADS: &[&str] = &["flat", "apartment", "unit", "suite", "po"];

const HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "miss", "mx", "dr", "prof", "sir", "rev", "lady", "lord",
];

/// Landlord block: from `LANDLORD` to the first contact, bank, tenant or
/// deposit marker, or to the start of the financial figures.
pub(crate) fn landlord_block(text: &str, financials_start: Option<usize>) -> Option<Span<'_>> {
    let (_, body_start) = anchors::find_from(text, anchors::landlord(), 0)?;
    let marker_stop = earliest_stop(
        text,
        &[
            anchors::telephone(),
            anchors::mobile(),
            anchors::email_marker(),
            anchors::email_address(),
            anchors::bank(),
            anchors::account_number(),
            anchors::sort_code(),
            anchors::tenant(),
            anchors::deposit(),
        ],
        body_start,
    );
    let body_end = [marker_stop, financials_start.filter(|start| *start >= body_start)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());

    Some(Span {
        start: body_start,
        text: &text[body_start..body_end],
    })
}

fn bare(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_lowercase()
}

fn is_honorific(token: &str) -> bool {
    HONORIFICS.contains(&bare(token).as_str())
}

/// Split the landlord block into a name and an address.
///
/// In order: a company keyword ends the name right after the last keyword
/// before the address starts; otherwise the name ends at the first
/// digit-leading token or address lead word (`Flat`, `Unit`). Only when there
/// is no such token does a street type end the name, before the word
/// preceding it (`Oak` in `Oak Street`). With no boundary the first four
/// tokens are taken when the first is a title, else three. A name made of
/// titles alone is never returned.
pub(crate) fn split_name_and_address(block: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = block.split_whitespace().collect();
    if tokens.is_empty() {
        return (None, None);
    }

    let address_start = tokens.iter().position(|token| {
        token.starts_with(|c: char| c.is_ascii_digit()) || ADDRESS_LEADS.contains(&bare(token).as_str())
    });
    let name_region = address_start.unwrap_or(tokens.len());
    let titles_only = |end: usize| tokens[..end].iter().all(|token| is_honorific(token));

    let company_end = tokens[..name_region]
        .iter()
        .rposition(|token| is_company_keyword(token))
        .map(|index| index + 1);

    let street_end = || {
        tokens
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, token)| STREET_TYPES.contains(&bare(token).as_str()))
            .map(|(index, _)| index - 1)
            .find(|&end| match end {
                0 => !is_honorific(tokens[0]),
                _ => !titles_only(end),
            })
    };

    let boundary = company_end
        .or(address_start)
        .or_else(street_end)
        .unwrap_or_else(|| {
            let take = if is_honorific(tokens[0]) { 4 } else { 3 };
            take.min(tokens.len())
        });

    let name = if boundary > 0 && titles_only(boundary) {
        None
    } else {
        sanitize_field(&tokens[..boundary].join(" "))
    };
    let address = sanitize_field(&tokens[boundary..].join(" "));
    (name, address)
}
