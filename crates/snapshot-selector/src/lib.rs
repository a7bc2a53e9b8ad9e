use chrono::{DateTime, Duration, Utc};
use screener_core::{FinancialPeriod, ViableSnapshot};
use serde_json::Value;
use thiserror::Error;

/// Why no snapshot could be selected. The two reasons are surfaced
/// separately so callers can tell "no share count" apart from "no usable
/// balance-sheet column in the window".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no positive share count; NCAV per share is not calculable")]
    NoShareCount,

    #[error("no viable balance-sheet column within {max_age_days} days")]
    NoViableColumn { max_age_days: i64 },
}

/// Current liabilities, deriving CL = TL - NCL when the line is missing.
pub fn resolved_current_liabilities(period: &FinancialPeriod) -> Option<f64> {
    period.liab_current.or_else(|| {
        match (period.liab_total, period.liab_noncurrent) {
            (Some(tl), Some(ncl)) => Some(tl - ncl),
            _ => None,
        }
    })
}

/// Current assets, trying the direct line, then working capital + CL,
/// then total assets - non-current assets.
pub fn resolved_current_assets(period: &FinancialPeriod) -> Option<f64> {
    if let Some(ca) = period.assets_current {
        return Some(ca);
    }
    if let (Some(wc), Some(cl)) = (period.working_capital, resolved_current_liabilities(period)) {
        return Some(wc + cl);
    }
    match (period.assets_total, period.assets_noncurrent) {
        (Some(ta), Some(nca)) => Some(ta - nca),
        _ => None,
    }
}

/// Total liabilities, deriving TL = CL + NCL when the line is missing.
pub fn resolved_total_liabilities(period: &FinancialPeriod) -> Option<f64> {
    period.liab_total.or_else(|| {
        match (resolved_current_liabilities(period), period.liab_noncurrent) {
            (Some(cl), Some(ncl)) => Some(cl + ncl),
            _ => None,
        }
    })
}

/// Walk the gathered candidate columns newest-first and pick the first
/// one within `max_age_days` of `now` where CA and TL both resolve and
/// NCAV per share is finite.
///
/// Candidates must already be sorted newest-first with quarterly winning
/// date ties (see `period_schema::candidate_periods`). Gathering first
/// and filtering second means stale-complete data never masks
/// fresher-incomplete data, and nothing older than the cutoff is chosen
/// no matter how complete it is.
pub fn select_latest_viable(
    candidates: &[FinancialPeriod],
    shares_out: Option<f64>,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> Result<ViableSnapshot, SelectionError> {
    let shares = match shares_out {
        Some(s) if s > 0.0 => s,
        _ => return Err(SelectionError::NoShareCount),
    };

    let cutoff = now.date_naive() - Duration::days(max_age_days);

    for candidate in candidates {
        if candidate.period_date < cutoff {
            continue;
        }
        let (ca, tl) = match (
            resolved_current_assets(candidate),
            resolved_total_liabilities(candidate),
        ) {
            (Some(ca), Some(tl)) => (ca, tl),
            _ => continue,
        };
        let ncav = ca - tl;
        let ncav_ps = ncav / shares;
        if !ncav_ps.is_finite() {
            continue;
        }
        tracing::debug!(
            date = %candidate.period_date,
            source = ?candidate.source,
            ncav_ps,
            "selected viable balance-sheet column"
        );
        return Ok(ViableSnapshot {
            statement_date: candidate.period_date,
            date_label: candidate.date_label.clone(),
            source: candidate.source,
            assets_current: ca,
            liab_total: tl,
            ncav,
            ncav_per_share: ncav_ps,
            shares_out: shares,
        });
    }

    Err(SelectionError::NoViableColumn { max_age_days })
}

/// Convenience entry for the shortlist phase: gather candidates straight
/// from a raw core record, take the share count from the newest candidate
/// that carries one, and select.
pub fn select_from_core(
    core: &Value,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> Result<ViableSnapshot, SelectionError> {
    let candidates = period_schema::candidate_periods(core);
    let shares = candidates.iter().find_map(|p| p.shares_out);
    select_latest_viable(&candidates, shares, max_age_days, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use screener_core::PeriodSource;

    fn now() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn period_days_ago(days: i64) -> FinancialPeriod {
        FinancialPeriod::new(
            now().date_naive() - Duration::days(days),
            PeriodSource::Quarterly,
        )
    }

    #[test]
    fn derives_missing_lines_from_counterparts() {
        let mut p = period_days_ago(10);
        p.liab_total = Some(300.0);
        p.liab_noncurrent = Some(120.0);
        assert_eq!(resolved_current_liabilities(&p), Some(180.0));

        p.working_capital = Some(50.0);
        assert_eq!(resolved_current_assets(&p), Some(230.0));

        let mut q = period_days_ago(10);
        q.assets_total = Some(900.0);
        q.assets_noncurrent = Some(600.0);
        assert_eq!(resolved_current_assets(&q), Some(300.0));

        let mut r = period_days_ago(10);
        r.liab_current = Some(70.0);
        r.liab_noncurrent = Some(30.0);
        assert_eq!(resolved_total_liabilities(&r), Some(100.0));
    }

    #[test]
    fn missing_share_count_is_reported_before_anything_else() {
        let mut p = period_days_ago(5);
        p.assets_current = Some(100.0);
        p.liab_total = Some(40.0);

        assert_eq!(
            select_latest_viable(&[p.clone()], None, 730, now()),
            Err(SelectionError::NoShareCount)
        );
        assert_eq!(
            select_latest_viable(&[p], Some(0.0), 730, now()),
            Err(SelectionError::NoShareCount)
        );
    }

    #[test]
    fn fresh_incomplete_never_masks_next_complete_within_window() {
        let incomplete = period_days_ago(30); // no CA/TL at all
        let mut complete = period_days_ago(120);
        complete.assets_current = Some(500.0);
        complete.liab_total = Some(200.0);

        let picked =
            select_latest_viable(&[incomplete, complete], Some(100.0), 730, now()).unwrap();
        assert_eq!(picked.statement_date, now().date_naive() - Duration::days(120));
        assert_eq!(picked.ncav, 300.0);
        assert_eq!(picked.ncav_per_share, 3.0);
    }

    #[test]
    fn stale_complete_column_is_never_chosen() {
        let mut stale = period_days_ago(800);
        stale.assets_current = Some(500.0);
        stale.liab_total = Some(200.0);

        assert_eq!(
            select_latest_viable(&[stale], Some(100.0), 730, now()),
            Err(SelectionError::NoViableColumn { max_age_days: 730 })
        );
    }

    #[test]
    fn selection_is_deterministic_for_fixed_inputs() {
        let mut a = period_days_ago(60);
        a.assets_current = Some(400.0);
        a.liab_total = Some(100.0);
        let mut b = period_days_ago(150);
        b.assets_current = Some(390.0);
        b.liab_total = Some(90.0);
        let candidates = vec![a, b];

        let first = select_latest_viable(&candidates, Some(10.0), 730, now()).unwrap();
        let second = select_latest_viable(&candidates, Some(10.0), 730, now()).unwrap();
        assert_eq!(first.statement_date, second.statement_date);
        assert_eq!(first.ncav_per_share, second.ncav_per_share);
    }

    #[test]
    fn select_from_core_gathers_and_picks() {
        let core = serde_json::json!({
            "financials": {
                "quarterly": {"periods": [
                    {"date": "2024-11-30", "shares_out": 100.0},
                    {"date": "2024-08-31", "assets_current": 250.0, "liab_total": 50.0},
                ]},
                "annual": {"periods": [
                    {"date": "2023-12-31", "assets_current": 240.0, "liab_total": 60.0},
                ]},
            }
        });
        let picked = select_from_core(&core, 730, now()).unwrap();
        assert_eq!(
            picked.statement_date,
            NaiveDate::from_ymd_opt(2024, 8, 31).unwrap()
        );
        assert_eq!(picked.ncav_per_share, 2.0);
    }
}
