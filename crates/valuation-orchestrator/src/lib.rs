use balance_metrics::{current_ratio, debt_to_equity, listing_currency, ncav_native, ncav_per_share};
use chrono::{DateTime, Utc};
use currency_utils::{convert_between, normalize_currency};
use data_quality::assess_staleness;
use flag_synthesizer::{classify_flags, FlagInputs};
use insider_classifier::insider_signal;
use screener_core::{
    CoreMeta, CurrencyRateTable, FinancialPeriod, ScreenError, ScreenerConfig, ValuationResult,
};
use serde_json::Value;
use trend_analysis::{
    max_change_within_3y, max_dilution_within_1y, pair_for_hoh, pair_for_qoq, pair_for_yoy,
    pct_change, share_change,
};

pub mod batch;
pub use batch::ScreeningService;

fn meta_from_core(core: &Value) -> Result<CoreMeta, ScreenError> {
    let raw = core
        .get("meta")
        .cloned()
        .ok_or_else(|| ScreenError::MissingIdentity("core record has no meta block".into()))?;
    let meta: CoreMeta = serde_json::from_value(raw)
        .map_err(|e| ScreenError::MissingIdentity(format!("unreadable meta block: {e}")))?;
    if meta.ticker.trim().is_empty() {
        return Err(ScreenError::MissingIdentity(
            "core record has no ticker".into(),
        ));
    }
    Ok(meta)
}

fn string_field(core: &Value, key: &str) -> Option<String> {
    core.get(key).and_then(Value::as_str).map(str::to_string)
}

fn ncav_from(period: Option<&FinancialPeriod>) -> Option<f64> {
    period.and_then(ncav_native)
}

/// Evaluate one ticker end to end: timeline, balance-sheet metrics, FX,
/// trends, dilution extrema, staleness, insider signal and flags, all
/// packaged into a single immutable `ValuationResult`.
///
/// The only failure is a missing ticker identity; every other absence
/// degrades to `None` fields and empty flag lists. `now` is caller
/// supplied so repeated runs over cached data are reproducible.
pub fn analyze_one_ticker(
    core: &Value,
    insider_blob: Option<&Value>,
    last_price: Option<f64>,
    fx_rates: &CurrencyRateTable,
    config: &ScreenerConfig,
    now: DateTime<Utc>,
) -> Result<ValuationResult, ScreenError> {
    let meta = meta_from_core(core)?;
    tracing::debug!(ticker = %meta.ticker, "starting net-net valuation");

    let timeline = period_schema::timeline_from_core(core);
    let latest = timeline.latest();

    // Core balance sheet / NCAV, all off the newest period.
    let cr = latest.and_then(current_ratio);
    let de = latest.and_then(debt_to_equity);
    let ncav = ncav_from(latest);
    let shares = latest.and_then(|p| p.shares_out);
    let ncav_ps = latest.and_then(|p| ncav_per_share(p, shares));

    // Cross-currency NCAV against the listing currency.
    let listing_ccy = listing_currency(&meta, &timeline);
    let ncav_usd = convert_between(ncav, listing_ccy.as_deref(), Some("USD"), fx_rates);
    let fx_rate_used = listing_ccy
        .as_deref()
        .and_then(|ccy| fx_rates.usd_per_unit(&normalize_currency(ccy)));

    // Valuation ratios.
    let mut price_to_ncavps = None;
    let mut margin_of_safety = None;
    if let (Some(price), Some(nps)) = (last_price, ncav_ps) {
        if nps != 0.0 {
            let ratio = price / nps;
            price_to_ncavps = Some(ratio);
            margin_of_safety = Some(1.0 - ratio);
        }
    }

    // Trend & dilution over the full timeline.
    let periods = timeline.as_slice();
    let windows = &config.trend_windows;
    let q_pair = pair_for_qoq(periods, windows);
    let h_pair = pair_for_hoh(periods, windows);
    let y_pair = pair_for_yoy(periods, windows);

    let ncav_qoq = q_pair.and_then(|(newer, older)| {
        pct_change(ncav_from(Some(older)), ncav_from(Some(newer)))
    });
    let ncav_hoh = h_pair.and_then(|(newer, older)| {
        pct_change(ncav_from(Some(older)), ncav_from(Some(newer)))
    });
    let ncav_yoy = y_pair.and_then(|(newer, older)| {
        pct_change(ncav_from(Some(older)), ncav_from(Some(newer)))
    });

    let dilution_qoq = q_pair.and_then(|(newer, older)| share_change(newer, older));
    let dilution_hoh = h_pair.and_then(|(newer, older)| share_change(newer, older));
    let dilution_yoy = y_pair.and_then(|(newer, older)| share_change(newer, older));

    let max_dil_1y = max_dilution_within_1y(periods, config.dilution_window_1y_days);
    let win3 = max_change_within_3y(periods, config.dilution_window_3y_days);

    // Data quality.
    let (is_outdated, age_days) = assess_staleness(latest, now, config.stale_after_days);

    // Insider activity.
    let insider = insider_signal(insider_blob);

    // Policy flags.
    let thresholds = &config.flag_thresholds;
    let (green_flags, red_flags) = classify_flags(
        &FlagInputs {
            price_to_ncavps,
            current_ratio: cr,
            debt_to_equity: de,
            ncav_qoq,
            ncav_hoh,
            ncav_yoy,
            dilution_qoq,
            dilution_hoh,
            dilution_yoy,
            max_dilution_1y: max_dil_1y,
            max_issue_3y: win3.max_issue,
            max_buyback_3y: win3.max_buyback,
            is_outdated,
        },
        thresholds,
    );

    let latest_label = latest.map(|p| p.date_label.clone());

    tracing::debug!(
        ticker = %meta.ticker,
        periods = timeline.len(),
        green = green_flags.len(),
        red = red_flags.len(),
        "net-net valuation complete"
    );

    Ok(ValuationResult {
        ticker: meta.ticker,
        exchange: meta.exchange,
        country_iso: meta.country_iso,
        sector: meta.sector,
        industry: meta.industry,
        reporting_currency: listing_ccy,
        latest_fs_date: latest_label.clone(),
        current_ratio: cr,
        debt_to_equity: de,
        ncav_total_native: ncav,
        ncav_total_usd: ncav_usd,
        ncav_per_share: ncav_ps,
        ncav_ps_shortlist: meta.ncav_ps_shortlist,
        shares_out: shares,
        last_price,
        price_to_ncavps,
        margin_of_safety,
        fx_rate_used,
        fx_source: Some("cache".to_string()),
        ncavps_fx_note: None,
        ncav_change_qoq: ncav_qoq,
        ncav_change_hoh: ncav_hoh,
        ncav_change_yoy: ncav_yoy,
        dilution_qoq,
        dilution_hoh,
        dilution_yoy,
        max_dilution_1y: max_dil_1y,
        max_issue_3y: win3.max_issue,
        max_buyback_3y: win3.max_buyback,
        is_outdated,
        data_age_days: age_days,
        fs_source: string_field(core, "fs_source"),
        note: string_field(core, "note"),
        insider_signal: insider.headline,
        green_flags,
        red_flags,
        core_period_count: timeline.len(),
        insider_records: insider.total_buy_trades,
        latest_period_label: latest_label,
        listing_note: meta.listing_note,
        passes_price_to_ncav_rule: price_to_ncavps
            .map_or(false, |ratio| ratio <= thresholds.price_to_ncav),
        has_recent_buyback: win3
            .max_buyback
            .map_or(false, |b| b < thresholds.buyback_3y),
        has_recent_dilution: win3
            .max_issue
            .map_or(false, |i| i > thresholds.dilution_1y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use currency_utils::normalize_rates;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn sample_core() -> Value {
        json!({
            "meta": {
                "ticker": "0123.HK",
                "exchange": "HKEX",
                "country_iso": "HK",
                "currency": "HKD",
            },
            "fs_source": "quarterly",
            "financials": {
                "quarterly": {"periods": [
                    {
                        "statement_date": "2024-12-31",
                        "balance": {
                            "assets_current": 900.0,
                            "assets_total": 1500.0,
                            "liab_current": 300.0,
                            "liab_total": 450.0,
                        },
                        "shares_out": 100.0,
                    },
                    {
                        "statement_date": "2024-09-30",
                        "balance": {
                            "assets_current": 880.0,
                            "liab_total": 460.0,
                        },
                        "shares_out": 100.0,
                    },
                    {
                        "statement_date": "2023-12-31",
                        "balance": {
                            "assets_current": 800.0,
                            "liab_total": 400.0,
                        },
                        "shares_out": 90.0,
                    },
                ]}
            }
        })
    }

    #[test]
    fn full_valuation_over_sample_core() {
        let rates = normalize_rates([("HKD", 0.128)]);
        let result = analyze_one_ticker(
            &sample_core(),
            None,
            Some(2.0),
            &rates,
            &ScreenerConfig::default(),
            now(),
        )
        .unwrap();

        assert_eq!(result.ticker, "0123.HK");
        assert_eq!(result.reporting_currency.as_deref(), Some("HKD"));
        assert_eq!(result.current_ratio, Some(3.0));
        assert_eq!(result.ncav_total_native, Some(450.0));
        assert_eq!(result.ncav_per_share, Some(4.5));
        let usd = result.ncav_total_usd.unwrap();
        assert!((usd - 57.6).abs() < 1e-9);
        assert_eq!(result.fx_rate_used, Some(0.128));

        // price 2.0 vs NCAV/share 4.5
        let ratio = result.price_to_ncavps.unwrap();
        assert!((ratio - 2.0 / 4.5).abs() < 1e-12);
        assert!(result.passes_price_to_ncav_rule);
        assert!(result.green_flags.contains(&"Trading ≤ 2/3 NCAV".to_string()));
        assert!(result.green_flags.contains(&"Current ratio ≥ 2".to_string()));
        assert!(!result.is_outdated);
        assert_eq!(result.core_period_count, 3);

        // 90 -> 100 shares across the YoY pair
        let dil = result.dilution_yoy.unwrap();
        assert!((dil - 1.0 / 9.0).abs() < 1e-9);
        assert!(result
            .red_flags
            .contains(&"Dilution YoY >5%".to_string()));
        assert!(result.has_recent_dilution);
    }

    #[test]
    fn missing_ticker_is_the_only_hard_failure() {
        let no_meta = json!({"financials": {}});
        assert!(matches!(
            analyze_one_ticker(
                &no_meta,
                None,
                None,
                &CurrencyRateTable::default(),
                &ScreenerConfig::default(),
                now()
            ),
            Err(ScreenError::MissingIdentity(_))
        ));

        let blank = json!({"meta": {"ticker": "  "}});
        assert!(matches!(
            analyze_one_ticker(
                &blank,
                None,
                None,
                &CurrencyRateTable::default(),
                &ScreenerConfig::default(),
                now()
            ),
            Err(ScreenError::MissingIdentity(_))
        ));
    }

    #[test]
    fn empty_timeline_degrades_to_absent_fields() {
        let core = json!({"meta": {"ticker": "GHOST"}});
        let result = analyze_one_ticker(
            &core,
            None,
            Some(1.0),
            &CurrencyRateTable::default(),
            &ScreenerConfig::default(),
            now(),
        )
        .unwrap();

        assert_eq!(result.core_period_count, 0);
        assert_eq!(result.current_ratio, None);
        assert_eq!(result.ncav_total_native, None);
        assert_eq!(result.price_to_ncavps, None);
        assert!(result.is_outdated);
        assert_eq!(result.data_age_days, None);
        assert!(result.green_flags.is_empty());
        assert_eq!(result.red_flags, vec!["Financials are stale"]);
        assert!(!result.passes_price_to_ncav_rule);
    }

    #[test]
    fn insider_blob_flows_into_signal_and_records() {
        let blob = json!({"total_buy_trades": 3, "total_sell_trades": 0});
        let result = analyze_one_ticker(
            &sample_core(),
            Some(&blob),
            None,
            &CurrencyRateTable::default(),
            &ScreenerConfig::default(),
            now(),
        )
        .unwrap();
        assert_eq!(
            result.insider_signal,
            screener_core::InsiderHeadline::Buy
        );
        assert_eq!(result.insider_records, Some(3.0));
    }

    #[test]
    fn stale_core_flags_and_ages() {
        let core = json!({
            "meta": {"ticker": "OLD"},
            "quarterly": [
                {"date": "2023-06-30", "assets_current": 10.0, "liab_total": 5.0}
            ]
        });
        let result = analyze_one_ticker(
            &core,
            None,
            None,
            &CurrencyRateTable::default(),
            &ScreenerConfig::default(),
            now(),
        )
        .unwrap();
        assert!(result.is_outdated);
        assert_eq!(result.data_age_days, Some(610));
        assert!(result
            .red_flags
            .contains(&"Financials are stale".to_string()));
    }
}
