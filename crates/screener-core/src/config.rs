use serde::Deserialize;

/// Nominal day gap plus tolerance for approximate period pairing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GapWindow {
    pub approx_days: i64,
    pub tolerance_days: i64,
}

impl GapWindow {
    pub const fn new(approx_days: i64, tolerance_days: i64) -> Self {
        Self {
            approx_days,
            tolerance_days,
        }
    }
}

/// Pairing windows for the three trend horizons.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TrendWindows {
    pub qoq: GapWindow,
    pub hoh: GapWindow,
    pub yoy: GapWindow,
}

impl Default for TrendWindows {
    fn default() -> Self {
        Self {
            qoq: GapWindow::new(90, 45),
            hoh: GapWindow::new(180, 60),
            yoy: GapWindow::new(365, 90),
        }
    }
}

/// Policy knobs for flag synthesis. Callers supply these; the rule
/// labels themselves are fixed.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    /// Price at or below this fraction of NCAV/share is a green flag.
    pub price_to_ncav: f64,
    pub current_ratio: f64,
    pub debt_to_equity: f64,
    /// A 3y share-count change below this marks a meaningful buyback.
    pub buyback_3y: f64,
    /// An NCAV change below this over any horizon is a red flag.
    pub ncav_drop: f64,
    /// Per-horizon dilution above this is a red flag.
    pub dilution: f64,
    pub dilution_1y: f64,
    pub issue_3y: f64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            price_to_ncav: 2.0 / 3.0,
            current_ratio: 2.0,
            debt_to_equity: 1.5,
            buyback_3y: -0.05,
            ncav_drop: -0.20,
            dilution: 0.05,
            dilution_1y: 0.08,
            issue_3y: 0.20,
        }
    }
}

/// Caller-supplied configuration for the whole screening core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Max statement age for the viability selector.
    pub viability_max_age_days: i64,
    /// Statements older than this are flagged stale in valuation.
    pub stale_after_days: i64,
    /// Looser staleness bound used during the shortlist phase.
    pub shortlist_stale_after_days: i64,
    pub dilution_window_1y_days: i64,
    pub dilution_window_3y_days: i64,
    pub trend_windows: TrendWindows,
    pub flag_thresholds: FlagThresholds,
    /// Worker-pool bound for batch screening.
    pub max_workers: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            viability_max_age_days: 730,
            stale_after_days: 540,
            shortlist_stale_after_days: 730,
            dilution_window_1y_days: 365,
            dilution_window_3y_days: 1095,
            trend_windows: TrendWindows::default(),
            flag_thresholds: FlagThresholds::default(),
            max_workers: 4,
        }
    }
}
