//! Rate aggregator (§4.J), grounded on
//! `original_source/app/model/rate.go`'s `CoingeckoRate`, including the
//! CNYE synthetic-asset derivation and its intentional raw/adjusted
//! numerator-denominator asymmetry (§9 open question c).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::db::{DbError, RateRepository};
use crate::model::Rate;
use crate::scheduler::ScheduledTask;

use super::syntax::{apply_float_syntax, round_half_up};

const CNY: &str = "cny";
const USDC: &str = "usdc";
const CNYE: &str = "cnye";

#[derive(Debug, Error)]
pub enum RateError {
    #[error("repository error: {0}")]
    Db(#[from] DbError),
    #[error("coingecko request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Looks up the configured float-syntax adjustment string for a
/// `(crypto, fiat)` pair. A concrete admin-configured syntax table is out
/// of scope (§1); callers inject whatever static or dynamic lookup their
/// deployment needs.
pub trait SyntaxLookup: Send + Sync {
    fn syntax_for(&self, crypto: &str, fiat: &str) -> String;
}

/// No adjustment for any pair — every rate passes through raw.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdjustment;

impl SyntaxLookup for NoAdjustment {
    fn syntax_for(&self, _crypto: &str, _fiat: &str) -> String {
        String::new()
    }
}

#[derive(Debug, Deserialize)]
struct CoingeckoResponse(HashMap<String, HashMap<String, f64>>);

pub struct RateAggregator {
    rate_repo: Arc<dyn RateRepository>,
    syntax_lookup: Arc<dyn SyntaxLookup>,
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cryptos: Vec<String>,
    fiats: Vec<String>,
    tick_interval: Duration,
}

impl RateAggregator {
    pub fn new(
        rate_repo: Arc<dyn RateRepository>,
        syntax_lookup: Arc<dyn SyntaxLookup>,
        base_url: String,
        api_key: Option<String>,
        cryptos: Vec<String>,
        fiats: Vec<String>,
        tick_interval: Duration,
    ) -> Self {
        RateAggregator {
            rate_repo,
            syntax_lookup,
            http: reqwest::Client::new(),
            base_url,
            api_key,
            cryptos,
            fiats,
            tick_interval,
        }
    }

    async fn fetch_prices(&self) -> Result<HashMap<String, HashMap<String, f64>>, RateError> {
        let ids: Vec<&str> = self.cryptos.iter().filter(|c| c.as_str() != CNYE).map(|s| s.as_str()).collect();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            self.fiats.join(",")
        );

        let mut req = self.http.get(&url).timeout(Duration::from_secs(15));
        if let Some(key) = &self.api_key {
            req = req.header("x-cg-demo-api-key", key);
        }

        let resp: CoingeckoResponse = req.send().await?.json().await?;
        Ok(resp.0)
    }

    fn raw_rate(prices: &HashMap<String, HashMap<String, f64>>, crypto: &str, fiat: &str) -> Option<f64> {
        prices.get(crypto)?.get(fiat).copied()
    }

    async fn tick(&self) -> Result<(), RateError> {
        let prices = match self.fetch_prices().await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "coingecko fetch failed, skipping tick");
                return Ok(());
            }
        };

        let now = Utc::now();
        let mut rows = Vec::new();

        for crypto in &self.cryptos {
            if crypto == CNYE {
                continue;
            }
            for fiat in &self.fiats {
                let Some(raw) = Self::raw_rate(&prices, crypto, fiat) else {
                    continue;
                };
                let syntax = self.syntax_lookup.syntax_for(crypto, fiat);
                let rate = apply_float_syntax(&syntax, raw);
                rows.push(Rate {
                    crypto: crypto.clone(),
                    fiat: fiat.clone(),
                    raw_rate: raw,
                    rate,
                    syntax,
                    created_at: now,
                });
            }
        }

        for fiat in &self.fiats {
            if let Some(row) = self.derive_cnye(&prices, fiat, now) {
                rows.push(row);
            }
        }

        if !rows.is_empty() {
            self.rate_repo.insert_rates(rows).await?;
        }
        Ok(())
    }

    /// CNYE derivation (§4.J step 4, §8 scenario S6). CNY itself is pegged
    /// to 1.0; every other fiat divides USDC's raw rate in that fiat by
    /// USDC/CNY's *adjusted* rate — the adjustment leg intentionally uses
    /// the syntax-adjusted denominator against a raw numerator (§9c), not
    /// symmetric treatment of both legs.
    fn derive_cnye(&self, prices: &HashMap<String, HashMap<String, f64>>, fiat: &str, now: chrono::DateTime<Utc>) -> Option<Rate> {
        if fiat == CNY {
            return Some(Rate {
                crypto: CNYE.to_string(),
                fiat: fiat.to_string(),
                raw_rate: 1.0,
                rate: 1.0,
                syntax: String::new(),
                created_at: now,
            });
        }

        let usdc_cny_raw = Self::raw_rate(prices, USDC, CNY)?;
        let usdc_fiat_raw = Self::raw_rate(prices, USDC, fiat)?;
        if usdc_cny_raw == 0.0 || usdc_fiat_raw == 0.0 {
            return None;
        }

        let usdc_cny_syntax = self.syntax_lookup.syntax_for(USDC, CNY);
        let usdc_cny_adj = apply_float_syntax(&usdc_cny_syntax, usdc_cny_raw);
        if usdc_cny_adj == 0.0 {
            return None;
        }

        let raw = round_half_up(usdc_fiat_raw / usdc_cny_adj, 6);
        Some(Rate {
            crypto: CNYE.to_string(),
            fiat: fiat.to_string(),
            raw_rate: raw,
            rate: raw,
            syntax: String::new(),
            created_at: now,
        })
    }
}

#[async_trait]
impl ScheduledTask for RateAggregator {
    fn name(&self) -> &str {
        "rate-aggregator"
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "rate aggregator tick failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> HashMap<String, HashMap<String, f64>> {
        let mut m = HashMap::new();
        let mut usdc = HashMap::new();
        usdc.insert(CNY.to_string(), 7.2);
        usdc.insert("usd".to_string(), 1.00);
        m.insert(USDC.to_string(), usdc);
        m
    }

    struct FixedSyntax;
    impl SyntaxLookup for FixedSyntax {
        fn syntax_for(&self, crypto: &str, fiat: &str) -> String {
            if crypto == USDC && fiat == CNY {
                "+0.05".to_string()
            } else {
                String::new()
            }
        }
    }

    #[test]
    fn cnye_derivation_scenario_s6() {
        let agg = RateAggregator::new(
            Arc::new(crate::db::memory::InMemoryRepository::new()),
            Arc::new(FixedSyntax),
            "https://example.invalid".to_string(),
            None,
            vec![USDC.to_string(), CNYE.to_string()],
            vec![CNY.to_string(), "usd".to_string()],
            Duration::from_secs(60),
        );

        let now = Utc::now();
        let usd_row = agg.derive_cnye(&prices(), "usd", now).unwrap();
        assert_eq!(usd_row.rate, round_half_up(1.00 / 7.25, 6));

        let cny_row = agg.derive_cnye(&prices(), CNY, now).unwrap();
        assert_eq!(cny_row.rate, 1.0);
    }
}
