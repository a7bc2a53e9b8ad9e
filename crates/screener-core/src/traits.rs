use crate::{CurrencyRateTable, ScreenError, ScreeningSummary, ValuationResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Port: supply the per-ticker financial-core record (meta + period
/// buckets) from cache or storage. `None` means the ticker has no record.
#[async_trait]
pub trait CoreRecordRepository: Send + Sync {
    async fn load_core(&self, ticker: &str) -> Result<Option<Value>, ScreenError>;
}

/// Port: supply the raw insider-activity blob for a ticker, if any.
#[async_trait]
pub trait InsiderRepository: Send + Sync {
    async fn load_insiders(&self, ticker: &str) -> Result<Option<Value>, ScreenError>;
}

/// Port: FX rates as USD per one unit of each currency code
/// (e.g. {"JPY": 0.0067, "HKD": 0.128}). Keys must arrive normalized.
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    async fn usd_per_unit(&self) -> Result<CurrencyRateTable, ScreenError>;
}

/// Port: latest close prices, keyed by ticker. Unavailable prices map
/// to `None` rather than being dropped.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn latest_closes(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, Option<f64>>, ScreenError>;
}

/// Port: persist a batch of valuation records. Returns labeled output
/// locations for the run summary.
#[async_trait]
pub trait ValuationWriter: Send + Sync {
    async fn write(
        &self,
        valuations: &[ValuationResult],
        fx_rates: &CurrencyRateTable,
    ) -> Result<HashMap<String, String>, ScreenError>;
}

/// Use case: screen a shortlist end to end.
#[async_trait]
pub trait ShortlistScreener: Send + Sync {
    async fn screen_shortlist(
        &self,
        items: &[crate::ShortlistItem],
    ) -> Result<ScreeningSummary, ScreenError>;
}
