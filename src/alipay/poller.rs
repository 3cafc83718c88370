//! Alipay bill poller (§4.I), grounded on
//! `original_source/app/task/alipay_mck.go`'s `syncBill`/`parseTransfer`:
//! every tick, query each channel's 5-minute bill window once (deduped per
//! tick) and push parsed, successful entries into the transfer queue.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::db::{ChannelRepository, DbError, OrderRepository};
use crate::model::{Channel, ChannelStatus, Order, OrderStatus, TradeType, Transfer};
use crate::notify::Notifier;
use crate::queue::QueueSender;
use crate::scheduler::ScheduledTask;

use super::client::{AlipayClient, AlipayError};

const TRADE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("repository error: {0}")]
    Db(#[from] DbError),
}

/// Polls every enabled `AlipayMck` channel with a waiting order on it.
pub struct AlipayPoller {
    order_repo: Arc<dyn OrderRepository>,
    channel_repo: Arc<dyn ChannelRepository>,
    notifier: Arc<dyn Notifier>,
    transfer_tx: QueueSender<Transfer>,
    tick_interval: Duration,
}

impl AlipayPoller {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        channel_repo: Arc<dyn ChannelRepository>,
        notifier: Arc<dyn Notifier>,
        transfer_tx: QueueSender<Transfer>,
        tick_interval: Duration,
    ) -> Self {
        AlipayPoller {
            order_repo,
            channel_repo,
            notifier,
            transfer_tx,
            tick_interval,
        }
    }

    async fn tick(&self) -> Result<(), PollerError> {
        let waiting: Vec<Order> = self
            .order_repo
            .get_waiting_orders()
            .await?
            .into_iter()
            .filter(|o| o.trade_type == TradeType::AlipayMck)
            .collect();

        if waiting.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut processed_channels: HashSet<String> = HashSet::new();
        let mut transfers: Vec<Transfer> = Vec::new();

        for order in waiting {
            if order.is_expired_at(now) {
                if self.order_repo.set_expired(&order.order_id).await?.applied() {
                    let mut expired = order.clone();
                    expired.status = OrderStatus::Expired;
                    self.notifier.order_lifecycle(&expired).await;
                }
                continue;
            }

            if !processed_channels.insert(order.address.clone()) {
                continue;
            }

            let channel = match self.channel_repo.find_by_match_qr(&order.address).await? {
                Some(c) => c,
                None => {
                    tracing::error!(order_id = %order.order_id, address = %order.address, "no channel for order address");
                    continue;
                }
            };

            if channel.status != ChannelStatus::Enabled {
                continue;
            }

            match self.poll_channel(&channel, now).await {
                Ok(mut batch) => transfers.append(&mut batch),
                Err(e) => {
                    tracing::error!(channel = %channel.name, error = %e, "alipay bill query failed");
                }
            }
        }

        if !transfers.is_empty() && self.transfer_tx.send(transfers).is_err() {
            tracing::warn!("transfer queue has no receiver; dropping alipay batch");
        }

        Ok(())
    }

    async fn poll_channel(&self, channel: &Channel, now: chrono::DateTime<Utc>) -> Result<Vec<Transfer>, AlipayError> {
        let client = AlipayClient::new(
            channel.config.app_id.clone(),
            &channel.config.private_key,
            &channel.config.public_key,
        )?;

        let start_time = now - chrono::Duration::minutes(WINDOW_MINUTES);
        let params = [
            ("start_time", start_time.format(TRADE_TIME_FORMAT).to_string()),
            ("end_time", now.format(TRADE_TIME_FORMAT).to_string()),
            ("page_no", "1".to_string()),
            ("page_size", "2000".to_string()),
        ];

        let body = client.get("/v3/alipay/data/bill/sell/query", &params).await?;
        let parsed: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "alipay response was not valid json");
                return Ok(Vec::new());
            }
        };

        let Some(detail_list) = parsed.get("detail_list").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        Ok(detail_list.iter().filter_map(parse_transfer).collect())
    }
}

/// `parseTransfer`: only `trade_status == "成功"` entries become transfers;
/// everything else (including malformed rows) is silently skipped.
fn parse_transfer(item: &Value) -> Option<Transfer> {
    if item.get("trade_status").and_then(Value::as_str) != Some("成功") {
        return None;
    }

    let total_amount_str = item.get("total_amount").and_then(Value::as_str)?;
    let amount = Decimal::from_str(total_amount_str).ok()?;

    let alipay_order_no = item.get("alipay_order_no").and_then(Value::as_str)?.to_string();
    if alipay_order_no.is_empty() {
        return None;
    }
    let merchant_order_no = item
        .get("merchant_order_no")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let other_account = item.get("other_account").and_then(Value::as_str).unwrap_or_default().to_string();

    let trade_time_str = item
        .get("gmt_payment")
        .and_then(Value::as_str)
        .or_else(|| item.get("gmt_create").and_then(Value::as_str));

    let timestamp = trade_time_str
        .and_then(|s| NaiveDateTime::parse_from_str(s, TRADE_TIME_FORMAT).ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now);

    Some(Transfer {
        network: "AlipayMck".to_string(),
        trade_type: TradeType::AlipayMck,
        tx_hash: alipay_order_no,
        amount,
        from_address: other_account,
        recv_address: merchant_order_no,
        timestamp,
        block_num: 0,
    })
}

#[async_trait]
impl ScheduledTask for AlipayPoller {
    fn name(&self) -> &str {
        "alipay-poller"
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "alipay poller tick failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transfer_skips_non_successful_status() {
        let item = serde_json::json!({
            "trade_status": "处理中",
            "total_amount": "10.00",
            "alipay_order_no": "2024ABC",
        });
        assert!(parse_transfer(&item).is_none());
    }

    #[test]
    fn parse_transfer_maps_fields_for_successful_entry() {
        let item = serde_json::json!({
            "trade_status": "成功",
            "total_amount": "10.50",
            "alipay_order_no": "2024ABC",
            "merchant_order_no": "order-123",
            "other_account": "138****1234",
            "gmt_payment": "2024-01-02 15:04:05",
        });
        let transfer = parse_transfer(&item).unwrap();
        assert_eq!(transfer.tx_hash, "2024ABC");
        assert_eq!(transfer.recv_address, "order-123");
        assert_eq!(transfer.amount, Decimal::from_str("10.50").unwrap());
        assert_eq!(transfer.trade_type, TradeType::AlipayMck);
    }

    #[test]
    fn parse_transfer_rejects_missing_order_no() {
        let item = serde_json::json!({
            "trade_status": "成功",
            "total_amount": "10.50",
            "alipay_order_no": "",
        });
        assert!(parse_transfer(&item).is_none());
    }
}
