use chrono::{NaiveDate, NaiveDateTime};
use currency_utils::extract_val;
use screener_core::{FinancialPeriod, PeriodSource, PeriodTimeline};
use serde_json::{Map, Value};

/// Date-only formats tried first, then formats carrying a time part.
const DATE_ONLY_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"];

/// Fields checked, in priority order, for the accounting period end date.
const DATE_KEYS: &[&str] = &["statement_date", "period_end", "date", "as_of_date", "fs_date"];

/// Currency-like keys checked on the period, then on its balance container.
const CURRENCY_KEYS: &[&str] = &["currency", "ccy", "report_ccy", "reporting_currency"];

/// Historical container names for nested balance-sheet shapes.
const BALANCE_CONTAINERS: &[&str] = &["balance", "balance_sheet", "bs"];

// Ordered alias tables, one per logical field; first value that coerces wins.
const ASSETS_CURRENT: &[&str] = &["assets_current", "total_current_assets", "current_assets"];
const ASSETS_TOTAL: &[&str] = &["assets_total", "total_assets"];
const ASSETS_NONCURRENT: &[&str] = &[
    "assets_noncurrent",
    "non_current_assets",
    "total_non_current_assets",
    "noncurrent_assets",
];
const LIAB_CURRENT: &[&str] = &["liab_current", "total_current_liabilities", "current_liabilities"];
const LIAB_TOTAL: &[&str] = &[
    "liab_total",
    "total_liabilities",
    "total_liab",
    "liabilities_total",
];
const LIAB_NONCURRENT: &[&str] = &[
    "liab_noncurrent",
    "non_current_liabilities",
    "total_non_current_liabilities",
    "noncurrent_liabilities",
];
const WORKING_CAPITAL: &[&str] = &["working_capital"];
const CASH: &[&str] = &["cash", "cash_and_equivalents", "cash_and_cash_equivalents"];
const SHORT_TERM_INVESTMENTS: &[&str] = &["short_term_investments", "st_investments"];
const RECEIVABLES: &[&str] = &["receivables", "accounts_receivable"];
const INVENTORY: &[&str] = &["inventory", "inventories"];
const EQUITY: &[&str] = &["equity", "shareholders_equity", "total_equity"];
const SHARES_OUT: &[&str] = &["shares_out", "shares_outstanding", "basic_shares_out"];
const OPERATING_INCOME: &[&str] = &["operating_income", "income_operating"];
const NET_INCOME: &[&str] = &["net_income", "income_net"];
const OPERATING_CASH_FLOW: &[&str] = &["operating_cash_flow", "cash_flow_operating"];
const CAPEX: &[&str] = &["capex", "capital_expenditure"];

/// Best-effort parse of "2024-12-31", "2024/12/31", ISO datetimes with or
/// without a trailing "Z", or "2024-12-31 00:00:00". First format that
/// matches wins; anything else is `None`.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in DATE_ONLY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn parse_date(raw: &Value) -> Option<NaiveDate> {
    raw.as_str().and_then(parse_date_str)
}

/// Extract the accounting period end date plus the raw label it came from.
pub fn extract_period_date(period: &Value) -> Option<(NaiveDate, String)> {
    let obj = period.as_object()?;
    for key in DATE_KEYS {
        if let Some(s) = obj.get(*key).and_then(Value::as_str) {
            if let Some(date) = parse_date_str(s) {
                return Some((date, s.trim().to_string()));
            }
        }
    }
    None
}

/// Reporting currency from a period snapshot: period-level keys first,
/// then the balance container. Uppercased.
pub fn detect_currency(period: &Value) -> Option<String> {
    let obj = period.as_object()?;
    for key in CURRENCY_KEYS {
        if let Some(s) = obj.get(*key).and_then(Value::as_str) {
            if !s.trim().is_empty() {
                return Some(s.trim().to_ascii_uppercase());
            }
        }
    }
    let bal = obj.get("balance").and_then(Value::as_object)?;
    for key in CURRENCY_KEYS {
        if let Some(s) = bal.get(*key).and_then(Value::as_str) {
            if !s.trim().is_empty() {
                return Some(s.trim().to_ascii_uppercase());
            }
        }
    }
    None
}

/// Resolve one logical balance field: balance-like containers first,
/// then the flat period, walking the alias list inside each container.
fn balance_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    for container_key in BALANCE_CONTAINERS {
        if let Some(bal) = obj.get(*container_key).and_then(Value::as_object) {
            for key in aliases {
                if let Some(v) = bal.get(*key).and_then(|raw| extract_val(raw)) {
                    return Some(v);
                }
            }
        }
    }
    for key in aliases {
        if let Some(v) = obj.get(*key).and_then(|raw| extract_val(raw)) {
            return Some(v);
        }
    }
    None
}

/// Share counts historically live in more places than balance fields:
/// flat on the period, inside a balance container, or in the period's
/// meta block. First positive count wins; zero or negative entries are
/// feed noise and the search keeps going.
fn shares_field(obj: &Map<String, Value>) -> Option<f64> {
    let positive = |v: f64| if v > 0.0 { Some(v) } else { None };

    for key in SHARES_OUT {
        if let Some(v) = obj.get(*key).and_then(|raw| extract_val(raw)).and_then(positive) {
            return Some(v);
        }
    }
    if let Some(v) = balance_field(obj, SHARES_OUT).and_then(positive) {
        return Some(v);
    }
    if let Some(meta) = obj.get("meta").and_then(Value::as_object) {
        for key in SHARES_OUT {
            if let Some(v) = meta.get(*key).and_then(|raw| extract_val(raw)).and_then(positive) {
                return Some(v);
            }
        }
    }
    None
}

/// Normalize one raw feed period into the canonical shape. Periods with
/// no parseable date are dropped by returning `None`.
pub fn normalize_period(raw: &Value, source: PeriodSource) -> Option<FinancialPeriod> {
    let (date, label) = extract_period_date(raw)?;
    let obj = raw.as_object()?;

    let mut period = FinancialPeriod::new(date, source);
    period.date_label = label;
    period.currency = detect_currency(raw);

    period.assets_current = balance_field(obj, ASSETS_CURRENT);
    period.assets_total = balance_field(obj, ASSETS_TOTAL);
    period.assets_noncurrent = balance_field(obj, ASSETS_NONCURRENT);
    period.liab_current = balance_field(obj, LIAB_CURRENT);
    period.liab_total = balance_field(obj, LIAB_TOTAL);
    period.liab_noncurrent = balance_field(obj, LIAB_NONCURRENT);
    period.working_capital = balance_field(obj, WORKING_CAPITAL);
    period.cash = balance_field(obj, CASH);
    period.short_term_investments = balance_field(obj, SHORT_TERM_INVESTMENTS);
    period.receivables = balance_field(obj, RECEIVABLES);
    period.inventory = balance_field(obj, INVENTORY);
    period.equity = balance_field(obj, EQUITY);
    period.shares_out = shares_field(obj);
    period.operating_income = balance_field(obj, OPERATING_INCOME);
    period.net_income = balance_field(obj, NET_INCOME);
    period.operating_cash_flow = balance_field(obj, OPERATING_CASH_FLOW);
    period.capex = balance_field(obj, CAPEX);

    Some(period)
}

/// Pull the raw period list for one bucket, supporting the three shapes
/// feeds have used over time:
///   core["financials"][bucket]["periods"], core["financials"][bucket]
///   as a bare list, and legacy core[bucket].
fn bucket_periods<'a>(core: &'a Value, bucket: &str) -> Vec<&'a Value> {
    let node = core.get("financials").and_then(|fin| fin.get(bucket));
    let list = match node {
        Some(Value::Object(map)) => map.get("periods").and_then(Value::as_array),
        Some(Value::Array(arr)) => Some(arr),
        _ => core.get(bucket).and_then(Value::as_array),
    };
    list.map(|arr| arr.iter().collect()).unwrap_or_default()
}

fn normalized_bucket(core: &Value, bucket: &str, source: PeriodSource) -> Vec<FinancialPeriod> {
    let mut periods: Vec<FinancialPeriod> = bucket_periods(core, bucket)
        .into_iter()
        .filter_map(|raw| normalize_period(raw, source))
        .collect();
    periods.sort_by(|a, b| b.period_date.cmp(&a.period_date));
    periods
}

/// Quarterly snapshots, newest-first.
pub fn quarters_sorted(core: &Value) -> Vec<FinancialPeriod> {
    normalized_bucket(core, "quarterly", PeriodSource::Quarterly)
}

/// Annual snapshots, newest-first.
pub fn annuals_sorted(core: &Value) -> Vec<FinancialPeriod> {
    normalized_bucket(core, "annual", PeriodSource::Annual)
}

/// Combine quarterly + annual into the canonical deduplicated timeline.
pub fn merge_timelines(
    quarterly: Vec<FinancialPeriod>,
    annual: Vec<FinancialPeriod>,
) -> PeriodTimeline {
    let mut all = quarterly;
    all.extend(annual);
    PeriodTimeline::new(all)
}

/// The deduplicated timeline for a whole core record.
pub fn timeline_from_core(core: &Value) -> PeriodTimeline {
    merge_timelines(quarters_sorted(core), annuals_sorted(core))
}

/// Every column from every bucket, un-deduplicated, newest-first with
/// quarterly winning date ties. This is the gather step for the
/// viability selector, which must see same-date columns from both
/// buckets rather than the collapsed timeline.
pub fn candidate_periods(core: &Value) -> Vec<FinancialPeriod> {
    let mut all = quarters_sorted(core);
    all.extend(annuals_sorted(core));
    all.sort_by(|a, b| {
        b.period_date
            .cmp(&a.period_date)
            .then_with(|| a.source.priority().cmp(&b.source.priority()))
    });
    all
}
