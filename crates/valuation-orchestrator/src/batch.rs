use crate::analyze_one_ticker;
use async_trait::async_trait;
use chrono::Utc;
use screener_core::{
    CoreRecordRepository, FxRateProvider, InsiderRepository, ScreenError, ScreenerConfig,
    ScreeningSummary, ShortlistItem, ShortlistScreener, ValuationResult, ValuationWriter,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Screens a shortlist end to end: one FX table per run, then each
/// ticker evaluated on a bounded worker pool and the results handed to
/// the writer in shortlist order.
///
/// Tickers with no core record are skipped, not failed; the valuation
/// core itself never blocks the batch.
pub struct ScreeningService {
    core_repo: Arc<dyn CoreRecordRepository>,
    insider_repo: Arc<dyn InsiderRepository>,
    fx_provider: Arc<dyn FxRateProvider>,
    writer: Arc<dyn ValuationWriter>,
    config: ScreenerConfig,
}

impl ScreeningService {
    pub fn new(
        core_repo: Arc<dyn CoreRecordRepository>,
        insider_repo: Arc<dyn InsiderRepository>,
        fx_provider: Arc<dyn FxRateProvider>,
        writer: Arc<dyn ValuationWriter>,
        config: ScreenerConfig,
    ) -> Self {
        Self {
            core_repo,
            insider_repo,
            fx_provider,
            writer,
            config,
        }
    }

    async fn evaluate_all(
        &self,
        items: &[ShortlistItem],
        fx_rates: Arc<screener_core::CurrencyRateTable>,
    ) -> Result<Vec<ValuationResult>, ScreenError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let now = Utc::now();

        let mut join_set = JoinSet::new();
        for (idx, item) in items.iter().cloned().enumerate() {
            let core_repo = Arc::clone(&self.core_repo);
            let insider_repo = Arc::clone(&self.insider_repo);
            let fx_rates = Arc::clone(&fx_rates);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (idx, None),
                };

                let core = match core_repo.load_core(&item.ticker).await {
                    Ok(Some(core)) => core,
                    Ok(None) => {
                        tracing::warn!(ticker = %item.ticker, "no core record, skipping");
                        return (idx, None);
                    }
                    Err(err) => {
                        tracing::warn!(ticker = %item.ticker, %err, "core load failed, skipping");
                        return (idx, None);
                    }
                };

                let insider_blob = match insider_repo.load_insiders(&item.ticker).await {
                    Ok(blob) => blob,
                    Err(err) => {
                        tracing::warn!(ticker = %item.ticker, %err, "insider load failed");
                        None
                    }
                };

                match analyze_one_ticker(
                    &core,
                    insider_blob.as_ref(),
                    item.last_price,
                    &fx_rates,
                    &config,
                    now,
                ) {
                    Ok(valuation) => (idx, Some(valuation)),
                    Err(err) => {
                        tracing::warn!(ticker = %item.ticker, %err, "valuation rejected");
                        (idx, None)
                    }
                }
            });
        }

        let mut indexed: Vec<(usize, ValuationResult)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Some(valuation))) => indexed.push((idx, valuation)),
                Ok((_, None)) => {}
                Err(err) => tracing::warn!(%err, "screening worker panicked"),
            }
        }
        indexed.sort_by_key(|(idx, _)| *idx);

        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }
}

#[async_trait]
impl ShortlistScreener for ScreeningService {
    async fn screen_shortlist(
        &self,
        items: &[ShortlistItem],
    ) -> Result<ScreeningSummary, ScreenError> {
        tracing::info!(tickers = items.len(), "screening shortlist");
        let fx_rates = Arc::new(self.fx_provider.usd_per_unit().await?);
        let results = self.evaluate_all(items, Arc::clone(&fx_rates)).await?;

        let output_paths = self.writer.write(&results, &fx_rates).await?;

        tracing::info!(screened = results.len(), "shortlist screening complete");
        Ok(ScreeningSummary {
            count: results.len(),
            output_paths,
        })
    }
}
