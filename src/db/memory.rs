//! In-process reference implementation of the repository traits (§4.D,
//! §6). Stands in for the out-of-scope SQL persistence layer (§1, §10.G):
//! every CAS transition a `sqlx` query would express as
//! `UPDATE ... WHERE status = $1` is expressed here as a guarded mutation
//! under a single mutex, which is the same compare-and-set contract without
//! a database underneath it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::repository::{ChannelRepository, NotifyRepository, OrderRepository, RateRepository, WalletRepository};
use super::{DbError, DbResult};
use crate::model::{
    trade_type::trade_configs, Channel, Order, OrderStatus, OrderTransition, Rate, TradeConfig, TradeType, Wallet,
};

#[derive(Default)]
struct State {
    orders: HashMap<String, Order>,
    channels: HashMap<String, Channel>,
    wallets: HashMap<String, Wallet>,
    notified: HashSet<String>,
    rates: HashMap<(String, String), Rate>,
}

/// Single shared store behind a mutex, implementing every repository trait.
/// Fine for the moderate concurrency this crate's own tests exercise; a
/// real deployment swaps this for a SQL-backed type satisfying the same
/// traits.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("in-memory repository mutex poisoned")
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn get_waiting_orders(&self) -> DbResult<Vec<Order>> {
        Ok(self
            .lock()
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Waiting)
            .cloned()
            .collect())
    }

    async fn get_confirming_orders(&self, trade_types: &[TradeType]) -> DbResult<Vec<Order>> {
        Ok(self
            .lock()
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Confirming && trade_types.contains(&o.trade_type))
            .cloned()
            .collect())
    }

    async fn is_ref_hash_used(&self, hash: &str) -> DbResult<bool> {
        Ok(self.lock().orders.values().any(|o| o.ref_hash == hash))
    }

    async fn get_trade_configs(&self) -> DbResult<HashMap<TradeType, TradeConfig>> {
        Ok(trade_configs())
    }

    async fn set_expired(&self, order_id: &str) -> DbResult<OrderTransition> {
        let mut state = self.lock();
        let Some(order) = state.orders.get_mut(order_id) else {
            return Err(DbError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Waiting {
            return Ok(OrderTransition::None);
        }
        order.status = OrderStatus::Expired;
        Ok(OrderTransition::Expired)
    }

    async fn mark_channel_confirming(
        &self,
        order_id: &str,
        merchant_order_no: &str,
        from_address: &str,
        tx_hash: &str,
        matched_at: DateTime<Utc>,
    ) -> DbResult<OrderTransition> {
        let mut state = self.lock();
        let Some(order) = state.orders.get_mut(order_id) else {
            return Err(DbError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Waiting {
            return Ok(OrderTransition::None);
        }
        order.status = OrderStatus::Confirming;
        order.merchant_order_no = Some(merchant_order_no.to_string());
        order.from_address = Some(from_address.to_string());
        order.matched_at = Some(matched_at);
        order.ref_hash = tx_hash.to_string();
        Ok(OrderTransition::ConfirmingChannel)
    }

    async fn mark_wallet_confirming(
        &self,
        order_id: &str,
        block_num: i64,
        from_address: &str,
        tx_hash: &str,
        matched_at: DateTime<Utc>,
    ) -> DbResult<OrderTransition> {
        let mut state = self.lock();
        let Some(order) = state.orders.get_mut(order_id) else {
            return Err(DbError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Waiting {
            return Ok(OrderTransition::None);
        }
        order.status = OrderStatus::Confirming;
        order.block_num = Some(block_num);
        order.from_address = Some(from_address.to_string());
        order.matched_at = Some(matched_at);
        order.ref_hash = tx_hash.to_string();
        Ok(OrderTransition::ConfirmingWallet)
    }

    async fn set_success(&self, order_id: &str) -> DbResult<OrderTransition> {
        let mut state = self.lock();
        let Some(order) = state.orders.get_mut(order_id) else {
            return Err(DbError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Confirming {
            return Ok(OrderTransition::None);
        }
        order.status = OrderStatus::Success;
        order.confirmed_at = Some(Utc::now());
        Ok(OrderTransition::Success)
    }

    async fn set_failed(&self, order_id: &str) -> DbResult<OrderTransition> {
        let mut state = self.lock();
        let Some(order) = state.orders.get_mut(order_id) else {
            return Err(DbError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Confirming {
            return Ok(OrderTransition::None);
        }
        order.status = OrderStatus::Failed;
        Ok(OrderTransition::Failed)
    }

    async fn insert_order(&self, order: Order) -> DbResult<()> {
        self.lock().orders.insert(order.order_id.clone(), order);
        Ok(())
    }
}

#[async_trait]
impl ChannelRepository for InMemoryRepository {
    async fn find_by_match_qr(&self, match_qr: &str) -> DbResult<Option<Channel>> {
        Ok(self.lock().channels.get(match_qr).cloned())
    }

    async fn upsert(&self, channel: Channel) -> DbResult<()> {
        self.lock().channels.insert(channel.match_qr.clone(), channel);
        Ok(())
    }
}

#[async_trait]
impl WalletRepository for InMemoryRepository {
    async fn get_watched(&self) -> DbResult<Vec<Wallet>> {
        Ok(self.lock().wallets.values().filter(|w| w.other_notify).cloned().collect())
    }

    async fn get_enabled_and_watched(&self) -> DbResult<Vec<Wallet>> {
        use crate::model::WalletStatus;
        Ok(self
            .lock()
            .wallets
            .values()
            .filter(|w| w.other_notify && w.status == WalletStatus::Enabled)
            .cloned()
            .collect())
    }

    async fn upsert(&self, wallet: Wallet) -> DbResult<()> {
        self.lock().wallets.insert(wallet.match_addr.clone(), wallet);
        Ok(())
    }
}

#[async_trait]
impl NotifyRepository for InMemoryRepository {
    async fn try_mark_notified(&self, txid: &str) -> DbResult<bool> {
        Ok(self.lock().notified.insert(txid.to_string()))
    }
}

#[async_trait]
impl RateRepository for InMemoryRepository {
    async fn insert_rates(&self, rows: Vec<Rate>) -> DbResult<()> {
        let mut state = self.lock();
        for row in rows {
            state.rates.insert((row.crypto.clone(), row.fiat.clone()), row);
        }
        Ok(())
    }

    async fn get_latest(&self, crypto: &str, fiat: &str) -> DbResult<Option<Rate>> {
        Ok(self.lock().rates.get(&(crypto.to_string(), fiat.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::order::OrderTransition as OT;
    use std::str::FromStr;

    fn waiting_order(id: &str, ref_hash: &str) -> Order {
        Order {
            order_id: id.to_string(),
            address: "addr".to_string(),
            trade_type: TradeType::UsdtTrc20,
            amount: rust_decimal::Decimal::from_str("10.000001").unwrap(),
            status: OrderStatus::Waiting,
            created_at: Utc::now(),
            expired_at: Utc::now(),
            ref_hash: ref_hash.to_string(),
            from_address: None,
            block_num: None,
            merchant_order_no: None,
            confirmed_at: None,
            matched_at: None,
        }
    }

    #[tokio::test]
    async fn wallet_confirm_then_success_round_trip() {
        let repo = InMemoryRepository::new();
        repo.insert_order(waiting_order("o1", "rh1")).await.unwrap();

        let t = repo
            .mark_wallet_confirming("o1", 100, "from", "hash", Utc::now())
            .await
            .unwrap();
        assert_eq!(t, OT::ConfirmingWallet);

        let t = repo.set_success("o1").await.unwrap();
        assert_eq!(t, OT::Success);
    }

    #[tokio::test]
    async fn double_transition_is_a_noop_not_an_overwrite() {
        let repo = InMemoryRepository::new();
        repo.insert_order(waiting_order("o1", "rh1")).await.unwrap();

        let first = repo.set_expired("o1").await.unwrap();
        let second = repo.set_expired("o1").await.unwrap();
        assert_eq!(first, OT::Expired);
        assert_eq!(second, OT::None);
    }

    #[tokio::test]
    async fn ref_hash_uniqueness_check_sees_inserted_orders() {
        let repo = InMemoryRepository::new();
        assert!(!repo.is_ref_hash_used("rh1").await.unwrap());
        repo.insert_order(waiting_order("o1", "rh1")).await.unwrap();
        assert!(repo.is_ref_hash_used("rh1").await.unwrap());
    }

    #[tokio::test]
    async fn notify_dedup_only_fires_once_per_txid() {
        let repo = InMemoryRepository::new();
        assert!(repo.try_mark_notified("tx1").await.unwrap());
        assert!(!repo.try_mark_notified("tx1").await.unwrap());
    }
}
