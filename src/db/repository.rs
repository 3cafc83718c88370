//! Abstract repository contracts (§4.D, §6). These are the only persistence
//! surface the core depends on; a concrete SQL implementation is out of
//! scope (§1, §10.G) — `super::memory::InMemoryRepository` is the
//! reference/test implementation used throughout this crate's own test
//! suite, playing the same role a `PostgresOrderRepository` /
//! `PostgresTradeRepository` pair would play for these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::DbResult;
use crate::model::{Channel, NotifyRecord, Order, OrderTransition, Rate, TradeConfig, TradeType, Wallet};

/// Order queries and state-machine transitions (§4.D, §4.E).
///
/// All reads are snapshot-consistent at call time; there are no cursors.
/// Every transition method is a compare-and-set: it only applies if the
/// order is still in the precondition status, and returns
/// `OrderTransition::None` otherwise — the idempotence required by §4.E and
/// §8 property 8.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get_waiting_orders(&self) -> DbResult<Vec<Order>>;

    async fn get_confirming_orders(&self, trade_types: &[TradeType]) -> DbResult<Vec<Order>>;

    async fn is_ref_hash_used(&self, hash: &str) -> DbResult<bool>;

    /// Static per-trade-type routing config (wallet vs channel target).
    async fn get_trade_configs(&self) -> DbResult<HashMap<TradeType, TradeConfig>>;

    /// waiting -> expired.
    async fn set_expired(&self, order_id: &str) -> DbResult<OrderTransition>;

    /// waiting -> confirming, channel path (§4.F).
    async fn mark_channel_confirming(
        &self,
        order_id: &str,
        merchant_order_no: &str,
        from_address: &str,
        tx_hash: &str,
        matched_at: DateTime<Utc>,
    ) -> DbResult<OrderTransition>;

    /// waiting -> confirming, wallet path (§4.F).
    async fn mark_wallet_confirming(
        &self,
        order_id: &str,
        block_num: i64,
        from_address: &str,
        tx_hash: &str,
        matched_at: DateTime<Utc>,
    ) -> DbResult<OrderTransition>;

    /// confirming -> success.
    async fn set_success(&self, order_id: &str) -> DbResult<OrderTransition>;

    /// confirming -> failed.
    async fn set_failed(&self, order_id: &str) -> DbResult<OrderTransition>;

    /// Admission of a brand-new waiting order. Order creation proper (rate
    /// lookup, amount computation) is out of scope (§1) — this is the
    /// narrow write the matcher's own tests need to set up fixtures.
    async fn insert_order(&self, order: Order) -> DbResult<()>;
}

/// Channel lookups (§4.F channel path, §4.I).
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn find_by_match_qr(&self, match_qr: &str) -> DbResult<Option<Channel>>;

    async fn upsert(&self, channel: Channel) -> DbResult<()>;
}

/// Watched-wallet lookups (§4.G, §4.H).
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// All wallets with `other_notify` enabled, regardless of status —
    /// used by the non-order loop (§4.G).
    async fn get_watched(&self) -> DbResult<Vec<Wallet>>;

    /// Wallets that are both enabled and watched — used by the resource
    /// loop (§4.H), which additionally gates on chain.
    async fn get_enabled_and_watched(&self) -> DbResult<Vec<Wallet>>;

    async fn upsert(&self, wallet: Wallet) -> DbResult<()>;
}

/// `NotifyRecord` dedup (§4.G, §4.H, §5).
#[async_trait]
pub trait NotifyRepository: Send + Sync {
    /// Atomically insert `NotifyRecord(txid)`. Returns `true` if this call
    /// performed the insert (i.e. notify), `false` if a record already
    /// existed (already notified — silently skip, per §5/§7).
    async fn try_mark_notified(&self, txid: &str) -> DbResult<bool>;
}

/// Rate rows (§3, §4.J).
#[async_trait]
pub trait RateRepository: Send + Sync {
    async fn insert_rates(&self, rows: Vec<Rate>) -> DbResult<()>;

    /// Newest row for `(crypto, fiat)` by insertion time, or `None` if the
    /// aggregator has never produced one.
    async fn get_latest(&self, crypto: &str, fiat: &str) -> DbResult<Option<Rate>>;
}

#[cfg(test)]
pub(crate) fn _assert_object_safe() {
    fn _takes_order(_: &dyn OrderRepository) {}
    fn _takes_channel(_: &dyn ChannelRepository) {}
    fn _takes_wallet(_: &dyn WalletRepository) {}
    fn _takes_notify(_: &dyn NotifyRepository) {}
    fn _takes_rate(_: &dyn RateRepository) {}
    let _ = NotifyRecord {
        txid: String::new(),
    };
}
