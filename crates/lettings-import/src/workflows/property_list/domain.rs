use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(LandlordId);
row_id!(PropertyId);
row_id!(TenantId);
row_id!(TenancyId);
row_id!(ChecklistItemId);

/// Words that mark a landlord name as a business rather than a person.
pub const COMPANY_KEYWORDS: &[&str] = &[
    "ltd",
    "limited",
    "llp",
    "plc",
    "properties",
    "investment",
    "investments",
    "estates",
    "inc",
    "corp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandlordKind {
    Company,
    Individual,
}

impl LandlordKind {
    /// Keyword heuristic; the source export carries no explicit flag.
    pub fn classify(name: &str) -> Self {
        let is_company = name
            .split_whitespace()
            .any(|token| is_company_keyword(token));
        if is_company {
            Self::Company
        } else {
            Self::Individual
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Individual => "individual",
        }
    }
}

pub(crate) fn is_company_keyword(token: &str) -> bool {
    let trimmed = token
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_lowercase();
    COMPANY_KEYWORDS.contains(&trimmed.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLandlord {
    pub name: String,
    pub kind: LandlordKind,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub sort_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
    pub address: String,
    /// Normalized full address used for deduplication.
    pub address_key: String,
    pub postcode: Option<String>,
    pub landlord_id: Option<LandlordId>,
    pub management_fee_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenancyStatus {
    Active,
    Expired,
}

impl TenancyStatus {
    /// Active while the end date is absent or still in the future.
    pub fn derive(end_date: Option<NaiveDate>, as_of: NaiveDate) -> Self {
        match end_date {
            Some(end) if end <= as_of => Self::Expired,
            _ => Self::Active,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
    Annually,
}

impl PaymentFrequency {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "pw" | "per week" => Some(Self::Weekly),
            "fortnightly" => Some(Self::Fortnightly),
            "monthly" | "pcm" | "per month" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "annually" | "yearly" | "pa" => Some(Self::Annually),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }
}

/// Where a tenant's deposit is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositScheme {
    Dps,
    Tds,
    MyDeposits,
    HeldByLandlord,
    HeldByAgent,
    Other,
}

impl DepositScheme {
    pub fn classify(holder: &str) -> Self {
        let upper = holder.to_ascii_uppercase();
        let words: Vec<&str> = upper
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        let has = |word: &str| words.contains(&word);

        if has("DPS") || upper.contains("DEPOSIT PROTECTION SERVICE") {
            Self::Dps
        } else if has("TDS") || upper.contains("TENANCY DEPOSIT SCHEME") {
            Self::Tds
        } else if has("MYDEPOSITS") || upper.contains("MY DEPOSITS") {
            Self::MyDeposits
        } else if has("LANDLORD") {
            Self::HeldByLandlord
        } else if has("AGENT") || has("AGENCY") || has("US") {
            Self::HeldByAgent
        } else {
            Self::Other
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dps => "dps",
            Self::Tds => "tds",
            Self::MyDeposits => "mydeposits",
            Self::HeldByLandlord => "landlord",
            Self::HeldByAgent => "agent",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTenancy {
    pub property_id: PropertyId,
    pub landlord_id: LandlordId,
    pub tenant_id: Option<TenantId>,
    pub rent_pence: Option<i64>,
    pub rent_frequency: Option<PaymentFrequency>,
    pub deposit_pence: Option<i64>,
    pub deposit_scheme: Option<DepositScheme>,
    pub deposit_held_by: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub period_months: Option<u32>,
    pub status: TenancyStatus,
    pub source_page: u32,
}

/// Compliance and onboarding checks tracked per tenancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItemKind {
    GasSafetyCertificate,
    EnergyPerformanceCertificate,
    ElectricalSafetyReport,
    DepositProtection,
    Inventory,
    RightToRent,
    HowToRentGuide,
    SmokeAndCoAlarms,
}

impl ChecklistItemKind {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::GasSafetyCertificate,
            Self::EnergyPerformanceCertificate,
            Self::ElectricalSafetyReport,
            Self::DepositProtection,
            Self::Inventory,
            Self::RightToRent,
            Self::HowToRentGuide,
            Self::SmokeAndCoAlarms,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::GasSafetyCertificate => "gas_safety_certificate",
            Self::EnergyPerformanceCertificate => "energy_performance_certificate",
            Self::ElectricalSafetyReport => "electrical_safety_report",
            Self::DepositProtection => "deposit_protection",
            Self::Inventory => "inventory",
            Self::RightToRent => "right_to_rent",
            Self::HowToRentGuide => "how_to_rent_guide",
            Self::SmokeAndCoAlarms => "smoke_and_co_alarms",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::GasSafetyCertificate => "Gas safety certificate",
            Self::EnergyPerformanceCertificate => "Energy performance certificate",
            Self::ElectricalSafetyReport => "Electrical installation condition report",
            Self::DepositProtection => "Deposit protection scheme",
            Self::Inventory => "Inventory",
            Self::RightToRent => "Right to rent check",
            Self::HowToRentGuide => "How to rent guide",
            Self::SmokeAndCoAlarms => "Smoke and CO alarms",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|kind| kind.key() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklistItem {
    pub tenancy_id: TenancyId,
    pub kind: ChecklistItemKind,
    pub completed: bool,
    pub document_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemRecord {
    pub id: ChecklistItemId,
    pub tenancy_id: TenancyId,
    pub kind: ChecklistItemKind,
    pub completed: bool,
    pub document_ref: Option<String>,
}

/// Row totals per table, used for run summaries and idempotence checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub landlords: usize,
    pub properties: usize,
    pub tenants: usize,
    pub tenancies: usize,
    pub checklist_items: usize,
}
