use chrono::{DateTime, Utc};
use screener_core::FinancialPeriod;

/// Decide whether the latest financial data is outdated.
///
/// Returns (is_outdated, age_days). A missing latest period is stale by
/// definition, with an unknown age. Never fails.
pub fn assess_staleness(
    latest: Option<&FinancialPeriod>,
    now: DateTime<Utc>,
    stale_after_days: i64,
) -> (bool, Option<i64>) {
    let Some(period) = latest else {
        return (true, None);
    };

    let age_days = (now.date_naive() - period.period_date).num_days();
    (age_days > stale_after_days, Some(age_days))
}
