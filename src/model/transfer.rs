//! The `Transfer` event record (§3), the shape both blockchain pollers and
//! the Alipay poller emit into the transfer queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::trade_type::TradeType;

/// An observed inbound value movement — on-chain transfer or Alipay bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Origin tag (`Tron`, `EVM-BEP20`, `AlipayMck`, ...); identifies the
    /// decoder only, never used for matching.
    pub network: String,
    /// Business classification key used for matching.
    pub trade_type: TradeType,
    /// Unique external id: on-chain txid, or Alipay's `alipay_order_no`.
    pub tx_hash: String,
    /// Always non-negative exact decimal.
    pub amount: Amount,
    pub from_address: String,
    /// For Alipay, carries the merchant's order number rather than an
    /// on-chain address — see §3.
    pub recv_address: String,
    /// Event time as supplied by the source, not ingest time.
    pub timestamp: DateTime<Utc>,
    /// Monotonic height; 0 when inapplicable (e.g. Alipay).
    pub block_num: i64,
}
