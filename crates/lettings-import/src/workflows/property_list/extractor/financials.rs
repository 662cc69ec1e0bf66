use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Which of the two unlabeled figures is the deposit.
///
/// The export prints the amounts side by side with no labels, and older
/// import scripts disagreed on the order. Operators confirm the choice
/// against the preview before committing a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountOrder {
    #[default]
    DepositFirst,
    RentFirst,
}

impl AmountOrder {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DepositFirst => "deposit-first",
            Self::RentFirst => "rent-first",
        }
    }
}

impl fmt::Display for AmountOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown amount order '{0}'")]
pub struct UnknownAmountOrder(pub String);

impl FromStr for AmountOrder {
    type Err = UnknownAmountOrder;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "deposit-first" => Ok(Self::DepositFirst),
            "rent-first" => Ok(Self::RentFirst),
            _ => Err(UnknownAmountOrder(value.to_string())),
        }
    }
}

fn quadruple_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|[\s£])£?(\d[\d,]*(?:\.\d{1,2})?)\s+£?(\d[\d,]*(?:\.\d{1,2})?)\s+(\d{1,2}/\d{1,2}/\d{4})\s+(\d{1,2}/\d{1,2}/\d{4})\b",
        )
        .expect("financial pattern compiles")
    })
}

/// Deposit, rent and tenancy dates in pounds and raw `dd/mm/yyyy` strings.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Financials {
    /// Byte offset of the first figure.
    pub(crate) start: usize,
    pub(crate) deposit: Option<f64>,
    pub(crate) rent: Option<f64>,
    pub(crate) tenancy_start: String,
    pub(crate) tenancy_end: String,
}

/// Two figures followed by two dates, searched from `from` (the end of the
/// landlord marker).
pub(crate) fn financials(text: &str, from: usize, order: AmountOrder) -> Option<Financials> {
    let captures = quadruple_pattern().captures_at(text, from.min(text.len()))?;
    let first = captures.get(1)?;
    let second = parse_pounds(&captures[2]);
    let (deposit, rent) = match order {
        AmountOrder::DepositFirst => (parse_pounds(first.as_str()), second),
        AmountOrder::RentFirst => (second, parse_pounds(first.as_str())),
    };

    Some(Financials {
        start: first.start(),
        deposit,
        rent,
        tenancy_start: captures[3].to_string(),
        tenancy_end: captures[4].to_string(),
    })
}

/// Plain pounds; no pence scaling happens here.
pub(crate) fn parse_pounds(raw: &str) -> Option<f64> {
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}
