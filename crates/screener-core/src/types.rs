use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which statement bucket a period came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodSource {
    Quarterly,
    Annual,
}

impl PeriodSource {
    /// Tie-break priority: quarterly wins a same-date collision.
    pub fn priority(&self) -> u8 {
        match self {
            PeriodSource::Quarterly => 0,
            PeriodSource::Annual => 1,
        }
    }
}

/// One reporting snapshot, normalized at ingestion.
///
/// Every quantity except the date is optional; absence means "unknown"
/// and must never be coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialPeriod {
    /// Accounting period end date; drives all ordering and gap arithmetic.
    pub period_date: NaiveDate,
    /// The date string as received from the feed, kept for reporting.
    pub date_label: String,
    pub source: PeriodSource,
    /// Reporting currency detected on the period, if any.
    pub currency: Option<String>,

    // Balance sheet
    pub assets_current: Option<f64>,
    pub assets_total: Option<f64>,
    pub assets_noncurrent: Option<f64>,
    pub liab_current: Option<f64>,
    pub liab_total: Option<f64>,
    pub liab_noncurrent: Option<f64>,
    pub working_capital: Option<f64>,
    pub cash: Option<f64>,
    pub short_term_investments: Option<f64>,
    pub receivables: Option<f64>,
    pub inventory: Option<f64>,
    pub equity: Option<f64>,
    pub shares_out: Option<f64>,

    // Income statement
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,

    // Cash flow
    pub operating_cash_flow: Option<f64>,
    pub capex: Option<f64>,
}

impl FinancialPeriod {
    /// A period with only a date; every quantity starts unknown.
    pub fn new(period_date: NaiveDate, source: PeriodSource) -> Self {
        Self {
            period_date,
            date_label: period_date.format("%Y-%m-%d").to_string(),
            source,
            currency: None,
            assets_current: None,
            assets_total: None,
            assets_noncurrent: None,
            liab_current: None,
            liab_total: None,
            liab_noncurrent: None,
            working_capital: None,
            cash: None,
            short_term_investments: None,
            receivables: None,
            inventory: None,
            equity: None,
            shares_out: None,
            operating_income: None,
            net_income: None,
            operating_cash_flow: None,
            capex: None,
        }
    }
}

/// Ordered sequence of periods, newest-first, one per date signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodTimeline {
    periods: Vec<FinancialPeriod>,
}

impl PeriodTimeline {
    /// Build a timeline from arbitrary periods: sort newest-first
    /// (quarterly before annual on equal dates), then keep the first
    /// period per date signature.
    pub fn new(mut periods: Vec<FinancialPeriod>) -> Self {
        periods.sort_by(|a, b| {
            b.period_date
                .cmp(&a.period_date)
                .then_with(|| a.source.priority().cmp(&b.source.priority()))
        });
        periods.dedup_by(|a, b| a.period_date == b.period_date);
        Self { periods }
    }

    pub fn latest(&self) -> Option<&FinancialPeriod> {
        self.periods.first()
    }

    pub fn as_slice(&self) -> &[FinancialPeriod] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// FX table mapping a currency code to the USD value of one unit.
/// Keys are expected to be normalized (uppercase, aliases collapsed)
/// at construction; a missing key means "unknown", never zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrencyRateTable(HashMap<String, f64>);

impl CurrencyRateTable {
    pub fn usd_per_unit(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    pub fn insert(&mut self, code: String, usd_per_unit: f64) {
        self.0.insert(code, usd_per_unit);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for CurrencyRateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Windowed share-count extrema. Issuance is positive, buybacks negative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DilutionWindowStats {
    /// Most positive share-count change in the window (worst dilution).
    pub max_issue: Option<f64>,
    /// Most negative share-count change in the window (best buyback).
    pub max_buyback: Option<f64>,
}

/// Categorical headline for insider activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsiderHeadline {
    Buy,
    Sell,
    #[serde(rename = "Net Buy")]
    NetBuy,
    #[serde(rename = "Net Sell")]
    NetSell,
    None,
    Unknown,
}

impl InsiderHeadline {
    pub fn as_label(&self) -> &'static str {
        match self {
            InsiderHeadline::Buy => "Buy",
            InsiderHeadline::Sell => "Sell",
            InsiderHeadline::NetBuy => "Net Buy",
            InsiderHeadline::NetSell => "Net Sell",
            InsiderHeadline::None => "None",
            InsiderHeadline::Unknown => "Unknown",
        }
    }
}

/// Collapsed insider activity: headline plus the raw quantities it was
/// derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderActivitySummary {
    pub headline: InsiderHeadline,
    pub total_buy_trades: Option<f64>,
    pub total_sell_trades: Option<f64>,
    /// Positive means insiders accumulated shares overall.
    pub net_shares_change: Option<f64>,
    pub last_activity_date: Option<String>,
    pub source: Option<String>,
}

/// Identity/listing block of a financial-core record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreMeta {
    #[serde(default)]
    pub ticker: String,
    pub exchange: Option<String>,
    pub country_iso: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    /// Trading/quote currency for this listing.
    #[serde(alias = "listing_currency")]
    pub currency: Option<String>,
    /// NCAV per share carried over from the shortlist phase, if any.
    pub ncav_ps_shortlist: Option<f64>,
    /// ADR board / GEM board note etc.
    pub listing_note: Option<String>,
}

/// The as-of-now balance-sheet column chosen by the viability selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViableSnapshot {
    pub statement_date: NaiveDate,
    pub date_label: String,
    pub source: PeriodSource,
    pub assets_current: f64,
    pub liab_total: f64,
    pub ncav: f64,
    pub ncav_per_share: f64,
    pub shares_out: f64,
}

/// One ticker to screen, with the last observed market price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortlistItem {
    pub ticker: String,
    pub last_price: Option<f64>,
}

/// Outcome of a batch screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningSummary {
    pub count: usize,
    pub output_paths: HashMap<String, String>,
}

/// Final per-ticker valuation record. Built exactly once by the
/// orchestrator; every field serializes as string/number/boolean/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    // Identity / listing info
    pub ticker: String,
    pub exchange: Option<String>,
    pub country_iso: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    /// Trading/quote currency for this equity.
    pub reporting_currency: Option<String>,
    /// Statement date actually used, as received (e.g. "2024-12-31").
    pub latest_fs_date: Option<String>,

    // Balance sheet / solvency / liquidity
    pub current_ratio: Option<f64>,
    /// total liabilities / (total assets - total liabilities)
    pub debt_to_equity: Option<f64>,

    // NCAV math
    pub ncav_total_native: Option<f64>,
    pub ncav_total_usd: Option<f64>,
    pub ncav_per_share: Option<f64>,
    /// NCAV/share carried from the shortlist phase, if any.
    pub ncav_ps_shortlist: Option<f64>,
    pub shares_out: Option<f64>,

    // Price snapshot & valuation
    pub last_price: Option<f64>,
    pub price_to_ncavps: Option<f64>,
    /// 1 - price_to_ncavps
    pub margin_of_safety: Option<f64>,

    // FX diagnostics
    /// reporting_currency -> USD rate actually applied.
    pub fx_rate_used: Option<f64>,
    pub fx_source: Option<String>,
    pub ncavps_fx_note: Option<String>,

    // NCAV change over time (burn or growth)
    pub ncav_change_qoq: Option<f64>,
    pub ncav_change_hoh: Option<f64>,
    pub ncav_change_yoy: Option<f64>,

    // Dilution / buyback tracking
    pub dilution_qoq: Option<f64>,
    pub dilution_hoh: Option<f64>,
    pub dilution_yoy: Option<f64>,
    pub max_dilution_1y: Option<f64>,
    pub max_issue_3y: Option<f64>,
    pub max_buyback_3y: Option<f64>,

    // Data quality / recency
    pub is_outdated: bool,
    pub data_age_days: Option<i64>,
    pub fs_source: Option<String>,
    pub note: Option<String>,

    // Signals / flags
    pub insider_signal: InsiderHeadline,
    pub green_flags: Vec<String>,
    pub red_flags: Vec<String>,

    // Debug / tracing
    pub core_period_count: usize,
    /// Currently the total buy-trade count from the insider summary.
    pub insider_records: Option<f64>,
    pub latest_period_label: Option<String>,
    pub listing_note: Option<String>,

    // Convenience booleans mirroring flag thresholds, duplicated so
    // consumers never have to re-parse flag strings.
    pub passes_price_to_ncav_rule: bool,
    pub has_recent_buyback: bool,
    pub has_recent_dilution: bool,
}
