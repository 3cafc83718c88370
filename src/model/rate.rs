//! `(crypto, fiat, raw_rate, rate, syntax)` rows appended by the rate
//! aggregator (§3, §4.J).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rate {
    pub crypto: String,
    pub fiat: String,
    pub raw_rate: f64,
    pub rate: f64,
    pub syntax: String,
    pub created_at: DateTime<Utc>,
}
