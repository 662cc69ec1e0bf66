use chrono::NaiveDate;
use lettings_import::config::ImportConfig;
use lettings_import::workflows::property_list::AmountOrder;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) import: Arc<ImportConfig>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_amount_order(raw: &str) -> Result<AmountOrder, String> {
    raw.parse::<AmountOrder>().map_err(|err| err.to_string())
}
