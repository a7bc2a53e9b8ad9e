use screener_core::{DilutionWindowStats, FinancialPeriod, GapWindow, TrendWindows};

/// (new - old) / |old|, as a fraction. Positive means it grew.
pub fn pct_change(old: Option<f64>, new: Option<f64>) -> Option<f64> {
    let old = old?;
    let new = new?;
    if old == 0.0 {
        return None;
    }
    Some((new - old) / old.abs())
}

/// Find two periods roughly `approx_days` apart (within the tolerance),
/// scanning the descending timeline from the newest period. Returns
/// (newer, older).
///
/// When no gap matches, the two most recent periods are paired instead:
/// an approximate trend beats none at all.
pub fn pick_pair_by_gap<'a>(
    periods: &'a [FinancialPeriod],
    window: GapWindow,
) -> Option<(&'a FinancialPeriod, &'a FinancialPeriod)> {
    if periods.len() < 2 {
        return None;
    }

    let newer = &periods[0];
    for older in &periods[1..] {
        let delta_days = (newer.period_date - older.period_date).num_days();
        if (delta_days - window.approx_days).abs() <= window.tolerance_days {
            return Some((newer, older));
        }
    }

    Some((&periods[0], &periods[1]))
}

/// ~90 day gap, quarter over quarter.
pub fn pair_for_qoq<'a>(
    periods: &'a [FinancialPeriod],
    windows: &TrendWindows,
) -> Option<(&'a FinancialPeriod, &'a FinancialPeriod)> {
    pick_pair_by_gap(periods, windows.qoq)
}

/// ~180 day gap, half over half.
pub fn pair_for_hoh<'a>(
    periods: &'a [FinancialPeriod],
    windows: &TrendWindows,
) -> Option<(&'a FinancialPeriod, &'a FinancialPeriod)> {
    pick_pair_by_gap(periods, windows.hoh)
}

/// ~365 day gap, year over year.
pub fn pair_for_yoy<'a>(
    periods: &'a [FinancialPeriod],
    windows: &TrendWindows,
) -> Option<(&'a FinancialPeriod, &'a FinancialPeriod)> {
    pick_pair_by_gap(periods, windows.yoy)
}

/// Share-count change across a pair. Positive means stock was issued
/// (dilution), negative means it was bought back.
pub fn share_change(newer: &FinancialPeriod, older: &FinancialPeriod) -> Option<f64> {
    pct_change(older.shares_out, newer.shares_out)
}

/// Examine every (newer, older) pair whose day gap falls in
/// [0, window_days] and record the worst issuance (most positive change)
/// and best buyback (most negative change).
///
/// All pairs are examined, not just adjacent ones: a company can show no
/// dilution between adjacent periods yet a severe one across a skipped
/// quarter. Quadratic on purpose; timelines stay small.
pub fn max_change_within_days(
    periods: &[FinancialPeriod],
    window_days: i64,
) -> DilutionWindowStats {
    let mut stats = DilutionWindowStats::default();

    for i in 0..periods.len() {
        for j in (i + 1)..periods.len() {
            let newer = &periods[i];
            let older = &periods[j];
            let gap = (newer.period_date - older.period_date).num_days();
            if gap < 0 || gap > window_days {
                continue;
            }
            let Some(chg) = share_change(newer, older) else {
                continue;
            };
            if stats.max_issue.map_or(true, |cur| chg > cur) {
                stats.max_issue = Some(chg);
            }
            if stats.max_buyback.map_or(true, |cur| chg < cur) {
                stats.max_buyback = Some(chg);
            }
        }
    }

    stats
}

/// Worst (most positive) issuance within roughly a year.
pub fn max_dilution_within_1y(periods: &[FinancialPeriod], window_days: i64) -> Option<f64> {
    max_change_within_days(periods, window_days).max_issue
}

/// Worst issuance and best buyback over roughly three years.
pub fn max_change_within_3y(
    periods: &[FinancialPeriod],
    window_days: i64,
) -> DilutionWindowStats {
    max_change_within_days(periods, window_days)
}
