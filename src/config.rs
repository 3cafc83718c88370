//! Runtime configuration, loaded from environment variables: `env::var`
//! with sensible dev defaults and a small `ConfigError::Missing` for the
//! handful of values that have none.

use std::env;
use std::time::Duration;

use crate::model::PaymentMatchMode;

#[derive(Debug, Clone)]
pub struct Config {
    /// Matcher batch-buffer drain cadence (§4.F).
    pub batch_tick_interval: Duration,
    /// Waiting/confirming order expiry-sweep cadence (§4.F, §4.K).
    pub order_check_interval: Duration,
    /// Alipay bill-query poll cadence (§4.I).
    pub alipay_poll_interval: Duration,
    /// Coingecko rate-aggregation poll cadence (§4.J).
    pub rate_poll_interval: Duration,
    /// Final-confirmation loop cadence (§4.K).
    pub final_confirm_interval: Duration,

    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    /// Coingecko ids to price, including the synthetic `cnye` entry the
    /// aggregator derives rather than fetches (§4.J).
    pub rate_cryptos: Vec<String>,
    /// Fiat currencies to price each crypto against (§4.J).
    pub rate_fiats: Vec<String>,

    /// Which amount-matching mode the matcher applies (§4.F).
    pub payment_match_mode: PaymentMatchMode,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let batch_tick_interval = duration_secs_var("BATCH_TICK_INTERVAL_SECS", 1)?;
        let order_check_interval = duration_secs_var("ORDER_CHECK_INTERVAL_SECS", 10)?;
        let alipay_poll_interval = duration_secs_var("ALIPAY_POLL_INTERVAL_SECS", 30)?;
        let rate_poll_interval = duration_secs_var("RATE_POLL_INTERVAL_SECS", 60)?;
        let final_confirm_interval = duration_secs_var("FINAL_CONFIRM_INTERVAL_SECS", 5)?;

        let coingecko_base_url = env::var("COINGECKO_BASE_URL")
            .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());
        let coingecko_api_key = env::var("COINGECKO_API_KEY").ok();
        let rate_cryptos = csv_var("RATE_CRYPTOS", &["usdc", "cnye"]);
        let rate_fiats = csv_var("RATE_FIATS", &["cny", "usd"]);

        let payment_match_mode = match env::var("PAYMENT_MATCH_MODE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PAYMENT_MATCH_MODE: {raw}")))?,
            Err(_) => PaymentMatchMode::Classic,
        };

        Ok(Config {
            batch_tick_interval,
            order_check_interval,
            alipay_poll_interval,
            rate_poll_interval,
            final_confirm_interval,
            coingecko_base_url,
            coingecko_api_key,
            rate_cryptos,
            rate_fiats,
            payment_match_mode,
        })
    }

    pub fn log_summary(&self) {
        tracing::info!(
            batch_tick_secs = self.batch_tick_interval.as_secs(),
            order_check_secs = self.order_check_interval.as_secs(),
            alipay_poll_secs = self.alipay_poll_interval.as_secs(),
            rate_poll_secs = self.rate_poll_interval.as_secs(),
            final_confirm_secs = self.final_confirm_interval.as_secs(),
            coingecko_base_url = %self.coingecko_base_url,
            coingecko_api_key_set = self.coingecko_api_key.is_some(),
            rate_cryptos = %self.rate_cryptos.join(","),
            rate_fiats = %self.rate_fiats.join(","),
            payment_match_mode = ?self.payment_match_mode,
            "configuration loaded"
        );
    }
}

fn csv_var(name: &str, default: &[&str]) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn duration_secs_var(name: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid(format!("{name}: {raw}"))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    #[allow(dead_code)]
    Missing(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "missing required config: {var}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_var_falls_back_to_default_when_unset() {
        env::remove_var("SOME_UNSET_INTERVAL_SECS_XYZ");
        let d = duration_secs_var("SOME_UNSET_INTERVAL_SECS_XYZ", 7).unwrap();
        assert_eq!(d, Duration::from_secs(7));
    }
}
