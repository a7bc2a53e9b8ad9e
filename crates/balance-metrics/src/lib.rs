use currency_utils::convert_between;
use screener_core::{CoreMeta, CurrencyRateTable, FinancialPeriod, PeriodTimeline};

/// current assets / current liabilities
pub fn current_ratio(period: &FinancialPeriod) -> Option<f64> {
    let ca = period.assets_current?;
    let cl = period.liab_current?;
    if cl == 0.0 {
        return None;
    }
    Some(ca / cl)
}

/// total liabilities / (total assets - total liabilities)
///
/// "Debt-to-equity" in the loose Graham sense: book equity is derived
/// from the two totals rather than read from the equity line.
pub fn debt_to_equity(period: &FinancialPeriod) -> Option<f64> {
    let ta = period.assets_total?;
    let tl = period.liab_total?;
    let equity = ta - tl;
    if equity == 0.0 {
        return None;
    }
    Some(tl / equity)
}

/// Net Current Asset Value in the reporting currency:
/// NCAV = current assets - total liabilities.
///
/// When current assets are unavailable (some regulatory feeds only carry
/// totals) this falls back to total assets, a documented rough
/// approximation rather than true current-asset NCAV.
pub fn ncav_native(period: &FinancialPeriod) -> Option<f64> {
    let ca = period.assets_current.or(period.assets_total)?;
    let tl = period.liab_total?;
    Some(ca - tl)
}

/// NCAV per share in the reporting currency.
pub fn ncav_per_share(period: &FinancialPeriod, shares_out: Option<f64>) -> Option<f64> {
    let total = ncav_native(period)?;
    let shares = shares_out?;
    if shares == 0.0 {
        return None;
    }
    Some(total / shares)
}

/// NCAV converted to USD using the period's detected currency.
pub fn ncav_usd(period: &FinancialPeriod, rates: &CurrencyRateTable) -> Option<f64> {
    let native = ncav_native(period)?;
    convert_between(Some(native), period.currency.as_deref(), Some("USD"), rates)
}

/// The currency the listing/quote is denominated in: meta first, then
/// sniffed from the most recent period.
pub fn listing_currency(meta: &CoreMeta, timeline: &PeriodTimeline) -> Option<String> {
    if let Some(ccy) = meta.currency.as_deref() {
        let trimmed = ccy.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_ascii_uppercase());
        }
    }
    timeline.latest().and_then(|p| p.currency.clone())
}
