//! The matcher (§4.F), grounded on `original_source/app/task/transfer.go`'s
//! `orderTransferHandle`: a single long-running loop that buffers incoming
//! transfers, periodically partitions the waiting-order snapshot into
//! wallet-path and channel-path maps, and matches each buffered transfer
//! against its candidates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::db::{DbError, OrderRepository};
use crate::model::{
    amount::round_half_up_decimal, trade_type::TargetType, Amount, Order, PaymentMatchMode, TradeType, Transfer,
};
use crate::notify::Notifier;
use crate::queue::{QueueReceiver, QueueSender};
use crate::scheduler::ScheduledTask;

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("repository error: {0}")]
    Db(#[from] DbError),
}

/// The channel path keys orders by `trade_type` alone (only `AlipayMck`
/// currently targets channel); the wallet path keys by `(recv_address,
/// trade_type)`.
fn partition_waiting(
    orders: Vec<Order>,
    configs: &HashMap<TradeType, crate::model::TradeConfig>,
) -> (HashMap<(String, TradeType), Vec<Order>>, HashMap<TradeType, Vec<Order>>) {
    let mut wallet_orders: HashMap<(String, TradeType), Vec<Order>> = HashMap::new();
    let mut channel_orders: HashMap<TradeType, Vec<Order>> = HashMap::new();

    for order in orders {
        let target = configs
            .get(&order.trade_type)
            .map(|c| c.target_type)
            .unwrap_or(TargetType::Wallet);
        match target {
            TargetType::Channel => channel_orders.entry(order.trade_type).or_default().push(order),
            TargetType::Wallet => wallet_orders
                .entry((order.address.clone(), order.trade_type))
                .or_default()
                .push(order),
        }
    }

    (wallet_orders, channel_orders)
}

/// `amount_match` (§4.F): three modes selected by `PaymentMatchMode`.
pub fn amount_match(a: Amount, target: Amount, trade_type: TradeType, mode: PaymentMatchMode) -> bool {
    match mode {
        PaymentMatchMode::Classic => a.normalize() == target.normalize(),
        PaymentMatchMode::HasPrefix => a.to_string().starts_with(&target.to_string()),
        PaymentMatchMode::RoundOff => {
            let p_std = trade_type.decimal_places();
            let p_tgt = target.scale();
            let p = if p_tgt != p_std { p_tgt } else { p_std };
            round_half_up_decimal(a, p) == round_half_up_decimal(target, p)
        }
    }
}

/// Expire every waiting order whose deadline has passed, firing a
/// lifecycle notification for each.
async fn sweep_expired(
    order_repo: &dyn OrderRepository,
    notifier: &dyn Notifier,
    waiting: &[Order],
) -> Result<(), MatcherError> {
    let now = Utc::now();
    for order in waiting {
        if order.is_expired_at(now) {
            if order_repo.set_expired(&order.order_id).await?.applied() {
                let mut expired = order.clone();
                expired.status = crate::model::OrderStatus::Expired;
                notifier.order_lifecycle(&expired).await;
            }
        }
    }
    Ok(())
}

pub struct Matcher {
    order_repo: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
    transfer_rx: AsyncMutex<QueueReceiver<Transfer>>,
    nonorder_tx: QueueSender<Transfer>,
    payment_match_mode: PaymentMatchMode,
    batch_tick_interval: Duration,
    order_check_interval: Duration,
}

impl Matcher {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        notifier: Arc<dyn Notifier>,
        transfer_rx: QueueReceiver<Transfer>,
        nonorder_tx: QueueSender<Transfer>,
        payment_match_mode: PaymentMatchMode,
        batch_tick_interval: Duration,
        order_check_interval: Duration,
    ) -> Self {
        Matcher {
            order_repo,
            notifier,
            transfer_rx: AsyncMutex::new(transfer_rx),
            nonorder_tx,
            payment_match_mode,
            batch_tick_interval,
            order_check_interval,
        }
    }

    async fn forward_to_non_order(&self, transfer: Transfer) {
        if self.nonorder_tx.send(vec![transfer]).is_err() {
            tracing::warn!("non-order queue has no receiver; dropping transfer");
        }
    }

    /// Process one drained buffer of transfers against a single waiting-order
    /// snapshot (§4.F steps 2-5).
    async fn process_buffer(&self, buffer: Vec<Transfer>) -> Result<(), MatcherError> {
        if buffer.is_empty() {
            return Ok(());
        }

        let waiting = self.order_repo.get_waiting_orders().await?;
        sweep_expired(self.order_repo.as_ref(), self.notifier.as_ref(), &waiting).await?;

        let still_waiting: Vec<Order> = waiting
            .into_iter()
            .filter(|o| !o.is_expired_at(Utc::now()))
            .collect();
        let configs = self.order_repo.get_trade_configs().await?;
        let (wallet_orders, channel_orders) = partition_waiting(still_waiting, &configs);

        for transfer in buffer {
            if !crate::model::trade_type::is_amount_valid(transfer.trade_type, transfer.amount) {
                continue;
            }

            let matched = if let Some(candidates) = channel_orders.get(&transfer.trade_type) {
                self.try_match_channel(&transfer, candidates).await?
            } else if let Some(candidates) = wallet_orders.get(&(transfer.recv_address.clone(), transfer.trade_type)) {
                self.try_match_wallet(&transfer, candidates).await?
            } else {
                false
            };

            if !matched {
                self.forward_to_non_order(transfer).await;
            }
        }

        Ok(())
    }

    async fn try_match_channel(&self, transfer: &Transfer, candidates: &[Order]) -> Result<bool, MatcherError> {
        if self.order_repo.is_ref_hash_used(&transfer.tx_hash).await? {
            return Ok(true);
        }

        let now = Utc::now();
        for order in candidates {
            if amount_match(transfer.amount, order.amount, transfer.trade_type, self.payment_match_mode)
                && transfer.timestamp > order.created_at
                && now < order.expired_at
            {
                let transition = self
                    .order_repo
                    .mark_channel_confirming(
                        &order.order_id,
                        &transfer.recv_address,
                        &transfer.from_address,
                        &transfer.tx_hash,
                        transfer.timestamp,
                    )
                    .await?;
                if transition.applied() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn try_match_wallet(&self, transfer: &Transfer, candidates: &[Order]) -> Result<bool, MatcherError> {
        for order in candidates {
            if amount_match(transfer.amount, order.amount, transfer.trade_type, self.payment_match_mode)
                && order.created_at < transfer.timestamp
                && transfer.timestamp < order.expired_at
            {
                let transition = self
                    .order_repo
                    .mark_wallet_confirming(
                        &order.order_id,
                        transfer.block_num,
                        &transfer.from_address,
                        &transfer.tx_hash,
                        transfer.timestamp,
                    )
                    .await?;
                if transition.applied() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn run_expiry_sweep(&self) -> Result<(), MatcherError> {
        let waiting = self.order_repo.get_waiting_orders().await?;
        sweep_expired(self.order_repo.as_ref(), self.notifier.as_ref(), &waiting).await
    }
}

#[async_trait]
impl ScheduledTask for Matcher {
    fn name(&self) -> &str {
        "matcher"
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut batch_ticker = tokio::time::interval(self.batch_tick_interval);
        let mut order_check_ticker = tokio::time::interval(self.order_check_interval);
        let mut buffer: Vec<Transfer> = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let mut rx = self.transfer_rx.lock().await;
                    buffer.extend(rx.drain_ready());
                    if let Err(e) = self.process_buffer(std::mem::take(&mut buffer)).await {
                        tracing::error!(error = %e, "matcher final drain failed");
                    }
                    return;
                }
                _ = batch_ticker.tick() => {
                    if !buffer.is_empty() {
                        if let Err(e) = self.process_buffer(std::mem::take(&mut buffer)).await {
                            tracing::error!(error = %e, "matcher tick failed");
                        }
                    }
                }
                _ = order_check_ticker.tick() => {
                    if let Err(e) = self.run_expiry_sweep().await {
                        tracing::error!(error = %e, "matcher expiry sweep failed");
                    }
                }
                batch = async { self.transfer_rx.lock().await.recv().await } => {
                    match batch {
                        Some(b) => buffer.extend(b),
                        None => return,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn classic_mode_requires_exact_equality() {
        let a = Decimal::from_str("10.5").unwrap();
        let b = Decimal::from_str("10.50").unwrap();
        assert!(amount_match(a, b, TradeType::UsdtTrc20, PaymentMatchMode::Classic));

        let c = Decimal::from_str("10.51").unwrap();
        assert!(!amount_match(a, c, TradeType::UsdtTrc20, PaymentMatchMode::Classic));
    }

    #[test]
    fn has_prefix_mode_s2_scenario() {
        let target = Decimal::from_str("10.5").unwrap();
        let matches = Decimal::from_str("10.5789").unwrap();
        let no_match = Decimal::from_str("10.49").unwrap();
        assert!(amount_match(matches, target, TradeType::UsdtTrc20, PaymentMatchMode::HasPrefix));
        assert!(!amount_match(no_match, target, TradeType::UsdtTrc20, PaymentMatchMode::HasPrefix));
    }

    #[test]
    fn round_off_mode_property_7() {
        // Order amounts carry the trade type's standard precision (trailing
        // zeros included) unless deliberately created coarser, so this order
        // amount's scale (6) equals p_std and no override applies.
        let a = Decimal::from_str("1.2345").unwrap();
        let b = Decimal::from_str("1.235000").unwrap();
        assert!(!amount_match(a, b, TradeType::UsdtTrc20, PaymentMatchMode::RoundOff));

        let c = Decimal::from_str("1.234500").unwrap();
        let d = Decimal::from_str("1.2345").unwrap();
        assert!(amount_match(c, d, TradeType::UsdtTrc20, PaymentMatchMode::RoundOff));
    }
}
